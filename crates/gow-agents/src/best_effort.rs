//! Fallible, non-propagating execution for side paths of a turn.
//!
//! Context reads, matching lookups, secondary generations and the interaction
//! log all degrade instead of failing the turn. Every such call goes through
//! [`best_effort`] so the swallow is explicit and always logged.

use std::fmt::Display;
use std::future::Future;

use tracing::warn;

/// Await `fut`, returning `Some(value)` on success. Errors are logged at `warn`
/// under `label` and turned into `None`.
pub async fn best_effort<T, E, F>(label: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{label} failed, continuing without it: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ok_values_pass_through() {
        let value = best_effort("lookup", async { Ok::<_, String>(7) }).await;
        assert_eq!(value, Some(7));
    }

    #[tokio::test]
    async fn errors_become_none() {
        let value: Option<u8> = best_effort("lookup", async { Err("store down") }).await;
        assert!(value.is_none());
    }
}
