use std::fmt;
use thiserror::Error;

/// What kind of identifier failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    NewsItem,
    User,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::NewsItem => write!(f, "news item"),
            LookupKind::User => write!(f, "user"),
        }
    }
}

/// Errors surfaced by the scoring and evaluation core.
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: LookupKind, id: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A similarity or collaborative-filter source failed. Never retried here.
    #[error("upstream source failed: {0:#}")]
    UpstreamFailure(anyhow::Error),
}

impl RecommendError {
    pub fn item_not_found(id: &str) -> Self {
        RecommendError::NotFound {
            kind: LookupKind::NewsItem,
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: &str) -> Self {
        RecommendError::NotFound {
            kind: LookupKind::User,
            id: id.to_string(),
        }
    }
}

pub type RecommendResult<T> = Result<T, RecommendError>;
