use async_trait::async_trait;
use gow_common::{
    InteractionRecord, InteractionSummary, MatchCandidate, ProjectDescriptor, Result, UserId,
    UserProfile,
};

/// Narrow read/write interface the assistant uses over persisted marketplace state.
///
/// Every read may fail (store unreachable, malformed rows); callers in the agent
/// core decide how to degrade. The only write is the append-only interaction log.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Persisted profile for `user_id`, or `None` if the user has no profile row.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>>;

    /// Up to `limit` prior turns for `user_id`, most recent first.
    async fn fetch_recent_interactions(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<InteractionSummary>>;

    /// The most recently created open project owned by `user_id`.
    async fn fetch_active_project(&self, user_id: &UserId) -> Result<Option<ProjectDescriptor>>;

    /// Open projects ranked by how well they fit the user's skills.
    async fn fetch_matching_projects(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>>;

    /// Service providers ranked by how well they fit `project`.
    async fn fetch_matching_freelancers(
        &self,
        project: &ProjectDescriptor,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>>;

    /// Append one turn to the interaction log.
    async fn append_interaction(&self, record: &InteractionRecord) -> Result<()>;
}
