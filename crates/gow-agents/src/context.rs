use gow_common::{InteractionSummary, ProjectDescriptor, UserId, UserProfile, UserRole};
use gow_db::ContextStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::best_effort::best_effort;

/// Caller-supplied, partial view of the user for one turn. Every field is
/// optional; missing fields are filled by enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default)]
    pub user_type: Option<UserRole>,
    #[serde(default)]
    pub current_page: Option<String>,
    #[serde(default)]
    pub profile_completeness: Option<u8>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub previous_interactions: Option<Vec<InteractionSummary>>,
    #[serde(default)]
    pub active_project: Option<ProjectDescriptor>,
}

/// Merged, resolved view of the user used to build one prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSnapshot {
    pub user_id: Option<UserId>,
    pub role: UserRole,
    pub current_page: Option<String>,
    pub profile_completeness: u8,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    /// Most recent first, bounded by the history window.
    pub previous_interactions: Vec<InteractionSummary>,
    pub active_project: Option<ProjectDescriptor>,
    /// Persisted profile, when one was found. Profile optimizations read it.
    pub profile: Option<UserProfile>,
}

/// One step of context enrichment. Layers only fill fields that are still
/// `None`, so whatever an earlier layer (or the caller) set always wins.
pub trait EnrichmentLayer {
    fn apply(&self, partial: UserContext) -> UserContext;
}

fn fill<T>(slot: &mut Option<T>, value: impl FnOnce() -> Option<T>) {
    if slot.is_none() {
        *slot = value();
    }
}

/// Fields taken from the persisted profile.
pub struct ProfileLayer<'a>(pub &'a UserProfile);

impl EnrichmentLayer for ProfileLayer<'_> {
    fn apply(&self, mut partial: UserContext) -> UserContext {
        let profile = self.0;
        fill(&mut partial.user_type, || Some(profile.role));
        fill(&mut partial.skills, || {
            (!profile.skills.is_empty()).then(|| profile.skills.clone())
        });
        fill(&mut partial.experience, || profile.experience.clone());
        fill(&mut partial.location, || profile.location.clone());
        fill(&mut partial.profile_completeness, || {
            Some(profile.completeness())
        });
        partial
    }
}

/// Prior turns read from the interaction log.
pub struct HistoryLayer(pub Vec<InteractionSummary>);

impl EnrichmentLayer for HistoryLayer {
    fn apply(&self, mut partial: UserContext) -> UserContext {
        fill(&mut partial.previous_interactions, || {
            (!self.0.is_empty()).then(|| self.0.clone())
        });
        partial
    }
}

/// The client's most recent open project.
pub struct ActiveProjectLayer(pub Option<ProjectDescriptor>);

impl EnrichmentLayer for ActiveProjectLayer {
    fn apply(&self, mut partial: UserContext) -> UserContext {
        fill(&mut partial.active_project, || self.0.clone());
        partial
    }
}

impl ContextSnapshot {
    /// Computed-defaults layer: resolve every remaining gap and bound the history.
    pub fn resolve(
        partial: UserContext,
        user_id: Option<UserId>,
        profile: Option<UserProfile>,
        history_limit: usize,
    ) -> Self {
        let mut previous_interactions = partial.previous_interactions.unwrap_or_default();
        previous_interactions.truncate(history_limit);

        Self {
            user_id,
            role: partial.user_type.unwrap_or_default(),
            current_page: partial.current_page,
            profile_completeness: partial.profile_completeness.unwrap_or(0).min(100),
            skills: partial.skills.unwrap_or_default(),
            experience: partial.experience,
            location: partial.location,
            previous_interactions,
            active_project: partial.active_project,
            profile,
        }
    }
}

/// Builds the per-turn [`ContextSnapshot`]. Store failures never escape:
/// each read is best-effort and a failed read leaves its fields to the next layer.
pub struct ContextEnricher<'a> {
    store: Option<&'a dyn ContextStore>,
    history_limit: usize,
}

impl<'a> ContextEnricher<'a> {
    pub fn new(store: Option<&'a dyn ContextStore>, history_limit: usize) -> Self {
        Self {
            store,
            history_limit,
        }
    }

    pub async fn enrich(&self, user_id: Option<&UserId>, caller: UserContext) -> ContextSnapshot {
        let (Some(store), Some(user_id)) = (self.store, user_id) else {
            return ContextSnapshot::resolve(caller, user_id.cloned(), None, self.history_limit);
        };

        let mut partial = caller;

        let profile = best_effort("profile lookup", store.fetch_profile(user_id))
            .await
            .flatten();
        if let Some(profile) = &profile {
            partial = ProfileLayer(profile).apply(partial);
        }

        if partial.previous_interactions.is_none() {
            let history = best_effort(
                "interaction history lookup",
                store.fetch_recent_interactions(user_id, self.history_limit),
            )
            .await
            .unwrap_or_default();
            partial = HistoryLayer(history).apply(partial);
        }

        let role = partial.user_type.unwrap_or_default();
        if role.hires() && partial.active_project.is_none() {
            let project = best_effort("active project lookup", store.fetch_active_project(user_id))
                .await
                .flatten();
            partial = ActiveProjectLayer(project).apply(partial);
        }

        let snapshot =
            ContextSnapshot::resolve(partial, Some(user_id.clone()), profile, self.history_limit);
        debug!(
            role = %snapshot.role,
            completeness = snapshot.profile_completeness,
            history = snapshot.previous_interactions.len(),
            has_project = snapshot.active_project.is_some(),
            "context enriched"
        );
        snapshot
    }
}
