//! Identity rules for the library hierarchy
//!
//! Every scope (bookcases of a library, shelves of a bookcase, books of a
//! shelf, items across all pages of a book) hands out IDs as
//! `max(existing) + 1`, starting at 1 for an empty scope.
//!
//! The counter is a `u64`. A scope whose highest ID is already `u64::MAX`
//! has no next ID, and allocation reports that instead of wrapping.
//!
//! IDs are never recycled because nothing is ever deleted. If deletion is
//! ever added this rule has to change, since removing the highest ID would
//! let it be handed out again.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("{label} ID must be a number, got '{value}'")]
    NotANumber { label: &'static str, value: String },
}

/// Numeric identifier, unique within its scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(u64);

impl Id {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Parses a user-supplied ID argument, naming the level in the error
    pub fn parse_arg(label: &'static str, value: &str) -> Result<Self, IdError> {
        value
            .trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdError::NotANumber {
                label,
                value: value.to_string(),
            })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Returns the next ID for a scope given the IDs already in it, or `None`
/// when the highest ID leaves no room
pub fn next_id<I>(existing: I) -> Option<Id>
where
    I: IntoIterator<Item = Id>,
{
    let max = existing.into_iter().map(Id::get).max().unwrap_or(0);
    max.checked_add(1).map(Id)
}
