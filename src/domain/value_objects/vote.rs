//! Vote value types.
//!
//! `VoteDirection` is what callers request and what a lookup reports
//! (including `None` for "no vote"); `VoteType` is what a ledger record
//! stores and can only be up or down.

use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Direction requested by a voter, or the current state of a voter's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteDirection {
    Up,
    Down,
    /// No vote recorded / retract the vote.
    #[default]
    None,
}

impl VoteDirection {
    /// Parse the wire representation (`UP`, `DOWN`, `NONE`, case-insensitive).
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(Self::Up),
            "DOWN" => Ok(Self::Down),
            "NONE" => Ok(Self::None),
            other => Err(AppError::Validation(format!(
                "Unknown vote direction '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::None => "NONE",
        }
    }

    /// The record type this direction would store, if any.
    pub fn as_vote_type(&self) -> Option<VoteType> {
        match self {
            Self::Up => Some(VoteType::Up),
            Self::Down => Some(VoteType::Down),
            Self::None => None,
        }
    }
}

impl From<Option<VoteType>> for VoteDirection {
    fn from(value: Option<VoteType>) -> Self {
        match value {
            Some(VoteType::Up) => Self::Up,
            Some(VoteType::Down) => Self::Down,
            None => Self::None,
        }
    }
}

impl std::fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction stored on a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    /// Convert from database string representation.
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(Self::Up),
            "DOWN" => Some(Self::Down),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

/// The votable kinds. Each kind has its own ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteTarget {
    Post,
    Comment,
}

impl VoteTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl std::fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Denormalized up/down counters of a votable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub upvotes: i32,
    pub downvotes: i32,
}

impl VoteTally {
    pub fn new(upvotes: i32, downvotes: i32) -> Self {
        Self { upvotes, downvotes }
    }

    /// Net score (upvotes minus downvotes).
    pub fn score(&self) -> i32 {
        self.upvotes - self.downvotes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direction() {
        assert_eq!(VoteDirection::parse("up").unwrap(), VoteDirection::Up);
        assert_eq!(VoteDirection::parse("DOWN").unwrap(), VoteDirection::Down);
        assert_eq!(VoteDirection::parse(" none ").unwrap(), VoteDirection::None);
        assert!(VoteDirection::parse("sideways").is_err());
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&VoteDirection::Up).unwrap();
        assert_eq!(json, "\"UP\"");
    }

    #[test]
    fn test_direction_from_record() {
        assert_eq!(VoteDirection::from(Some(VoteType::Down)), VoteDirection::Down);
        assert_eq!(VoteDirection::from(None), VoteDirection::None);
    }
}
