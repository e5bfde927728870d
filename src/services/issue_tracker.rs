use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::domain::ticket::{Ticket, Transition};
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    /// Unassigned to-do issues of the configured project updated since `since`, oldest first.
    async fn search_candidates(&self, since: DateTime<FixedOffset>) -> AppResult<Vec<Ticket>>;
    async fn add_comment(&self, issue_key: &str, body: &str) -> AppResult<()>;
    async fn assign_issue(&self, issue_key: &str, account_id: &str) -> AppResult<()>;
    async fn list_transitions(&self, issue_key: &str) -> AppResult<Vec<Transition>>;
    /// Applies the transition named `transition_name`, failing if the issue does not offer it.
    async fn transition_issue(&self, issue_key: &str, transition_name: &str) -> AppResult<()>;
}
