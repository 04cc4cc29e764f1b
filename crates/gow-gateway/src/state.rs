use std::sync::Arc;
use std::time::Instant;

use gow_agents::GowAgent;

/// Shared state handed to every request handler.
pub struct AppState {
    pub agent: GowAgent,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(agent: GowAgent) -> Self {
        Self {
            agent,
            started_at: Instant::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;
