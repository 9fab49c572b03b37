//! Administrative directory lookups for staff.
//!
//! The handler maps free text onto the closed `DirectoryQuery` set and
//! formats the rows verbatim. It never calls the generation provider.

use async_trait::async_trait;
use campanile_core::directory::{DirectoryQuery, DirectoryRow, DirectoryStore};
use campanile_core::error::Result;
use campanile_core::handler::{AgentHandler, AgentResponse, ConversationContext, Intent};
use campanile_core::session::{Role, Session};
use std::sync::Arc;
use tracing::{debug, info};

/// The role gate lives in the orchestrator; this is the backstop for
/// handlers invoked directly.
const PERMISSION_DENIED: &str =
    "You don't have permission to access administrative features.";

const UNRECOGNIZED: &str = "I can report the number of registered users, list users by role \
(student, faculty or administrator), or show recent conversations. Could you rephrase your \
request as one of those?";

const RECENT_CONVERSATION_LIMIT: usize = 10;

pub struct AdminHandler {
    directory: Arc<dyn DirectoryStore>,
}

impl AdminHandler {
    pub fn new(directory: Arc<dyn DirectoryStore>) -> Self {
        Self { directory }
    }

    /// Map free text onto a supported lookup. Count phrases win over role
    /// words so "how many student users" is a count, not a role listing.
    fn parse_query(query: &str) -> Option<DirectoryQuery> {
        let lowered = query.to_lowercase();

        if lowered.contains("how many users")
            || lowered.contains("user count")
            || lowered.contains("all users")
        {
            return Some(DirectoryQuery::UserCount);
        }
        if lowered.contains("recent conversation") || lowered.contains("recent activity") {
            return Some(DirectoryQuery::RecentConversations {
                limit: RECENT_CONVERSATION_LIMIT,
            });
        }
        for (word, role) in [
            ("student", Role::Student),
            ("faculty", Role::Faculty),
            ("administrator", Role::Admin),
        ] {
            if lowered.contains(word) {
                return Some(DirectoryQuery::UsersByRole { role });
            }
        }
        None
    }

    fn format_rows(rows: &[DirectoryRow]) -> String {
        if rows.is_empty() {
            return "No records found.".to_string();
        }
        rows.iter()
            .map(|row| {
                row.columns
                    .iter()
                    .map(|(label, value)| format!("{label}: {value}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl AgentHandler for AdminHandler {
    fn kind(&self) -> Intent {
        Intent::Admin
    }

    async fn invoke(
        &self,
        query: &str,
        _context: &ConversationContext,
        session: &Session,
    ) -> Result<AgentResponse> {
        if !session.role.can_query_directory() {
            info!(user = %session.user, role = %session.role, "Blocked directory access");
            return Ok(AgentResponse::new(Intent::Admin, PERMISSION_DENIED));
        }

        let Some(parsed) = Self::parse_query(query) else {
            debug!(query, "No directory lookup matched");
            return Ok(AgentResponse::new(Intent::Admin, UNRECOGNIZED));
        };

        let rows = self.directory.query(parsed).await?;
        debug!(rows = rows.len(), "Directory lookup complete");
        Ok(AgentResponse::new(Intent::Admin, Self::format_rows(&rows)))
    }
}
