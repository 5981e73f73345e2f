//! Helpers shared by every route file.

use atelier_infra::{EngineError, EngineResult, StoreError};

/// Actor recorded on movements when the request names nobody.
pub const SYSTEM_ACTOR: &str = "system";

/// Resolve the acting user for a request.
pub fn actor(requested: Option<String>) -> String {
    requested.unwrap_or_else(|| SYSTEM_ACTOR.to_string())
}

/// Run a synchronous service call on the blocking pool.
///
/// The Postgres store bridges its sync trait methods back into the runtime
/// and must not be called from an async worker thread.
pub async fn run<T, F>(task: F) -> EngineResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> EngineResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result,
        Err(error) => Err(EngineError::Store(StoreError::Unavailable(format!(
            "blocking task failed: {error}"
        )))),
    }
}
