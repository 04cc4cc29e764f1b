use gow_common::{Intent, InteractionRecord, UserId};
use gow_db::ContextStore;
use tracing::debug;

use crate::best_effort::best_effort;

/// Appends one record per answered turn. Anonymous turns are not logged and
/// write failures never reach the caller.
pub struct InteractionLogger<'a> {
    store: Option<&'a dyn ContextStore>,
}

impl<'a> InteractionLogger<'a> {
    pub fn new(store: Option<&'a dyn ContextStore>) -> Self {
        Self { store }
    }

    /// Returns whether a record was written.
    ///
    /// Called after the response is fully built, so awaiting it delays the turn
    /// by one local write but never changes what the caller receives. A write
    /// failure is swallowed here and the response goes out unchanged.
    pub async fn log(
        &self,
        user_id: Option<&UserId>,
        message: &str,
        raw_response: &str,
        intent: Intent,
    ) -> bool {
        let (Some(store), Some(user_id)) = (self.store, user_id) else {
            return false;
        };

        let record = InteractionRecord::new(user_id.clone(), message, raw_response, intent);
        let written = best_effort("interaction log write", store.append_interaction(&record))
            .await
            .is_some();
        if written {
            debug!(record_id = %record.id, %intent, "interaction logged");
        }
        written
    }
}
