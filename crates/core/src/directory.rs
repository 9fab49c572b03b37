//! The structured admin store — an opaque external collaborator.
//!
//! The lookup surface is a closed set of parameterized queries; free-form
//! query construction (and therefore injection safety) is the store's own
//! contract, not re-specified here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::session::Role;

/// The closed set of lookups the Admin handler may issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryQuery {
    /// Total number of registered users.
    UserCount,
    /// Users holding a given role.
    UsersByRole { role: Role },
    /// The most recent recorded conversations.
    RecentConversations { limit: usize },
}

/// One result row: ordered column label/value pairs, formatted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRow {
    pub columns: Vec<(String, String)>,
}

impl DirectoryRow {
    pub fn new(columns: Vec<(&str, String)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(label, value)| (label.to_string(), value))
                .collect(),
        }
    }
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn query(
        &self,
        query: DirectoryQuery,
    ) -> std::result::Result<Vec<DirectoryRow>, DirectoryError>;
}
