//! Tri-state result of an existence query.

use std::fmt;

/// Outcome of asking an external system whether something exists.
///
/// A failed query is kept distinct from "not found"; each caller decides how
/// to treat [`Presence::QueryFailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    /// The object exists
    Exists,
    /// The system answered and the object does not exist
    NotFound,
    /// The system could not answer
    QueryFailed(String),
}

impl Presence {
    /// `Exists` when `found`, otherwise `NotFound`
    pub fn from_bool(found: bool) -> Self {
        if found { Presence::Exists } else { Presence::NotFound }
    }

    /// Whether the object is known to exist
    pub fn exists(&self) -> bool {
        matches!(self, Presence::Exists)
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Exists => write!(f, "exists"),
            Presence::NotFound => write!(f, "not found"),
            Presence::QueryFailed(reason) => write!(f, "query failed: {reason}"),
        }
    }
}
