//! Vote kinds and the shapes returned by vote toggles and tallies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Like,
    Dislike,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Like => "LIKE",
            VoteType::Dislike => "DISLIKE",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LIKE" => Ok(VoteType::Like),
            "DISLIKE" => Ok(VoteType::Dislike),
            other => Err(DomainError::validation(format!(
                "vote type must be LIKE or DISLIKE, got '{}'",
                other
            ))),
        }
    }
}

/// Result of a vote toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_type: Option<VoteType>,
}

impl VoteOutcome {
    pub fn cast(vote_type: VoteType) -> Self {
        Self {
            removed: false,
            current_type: Some(vote_type),
        }
    }

    pub fn retracted() -> Self {
        Self {
            removed: true,
            current_type: None,
        }
    }
}

/// Like/dislike tally of one review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVoteCount {
    pub review_id: String,
    pub likes: i64,
    pub dislikes: i64,
}

/// The requesting user's own vote on one review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVote {
    pub review_id: String,
    #[serde(rename = "type")]
    pub vote_type: Option<VoteType>,
}
