//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM, no Axum) apart
//! from the conversion of database errors into `DomainError`.
//! Only value types, validation rules and domain error types.

pub mod errors;
pub mod ratings;
pub mod votes;

pub use errors::DomainError;
pub use ratings::*;
pub use votes::*;
