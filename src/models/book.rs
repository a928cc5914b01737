use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::RatingAggregate;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    /// Rounded to one decimal place. NULL while no review carries a rating.
    /// Maintained by the rating aggregator only.
    pub average_rating: Option<f64>,
    /// Number of reviews with a non-null rating across all editions
    pub rating_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::edition::Entity")]
    Editions,
}

impl Related<super::edition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Editions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn rating(&self) -> RatingAggregate {
        RatingAggregate::from_stored(self.average_rating, self.rating_count)
    }
}

// DTO for catalogue bootstrap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDto {
    pub id: String,
    pub title: String,
}
