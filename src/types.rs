use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::Deserialize;

/// Canonical category name type.
pub type CategoryName = String;

/// Identifier of an armed or running refresh task.
pub type TaskId = String;

/// Identifier of a group member, as published by the group producers.
pub type PlayerId = String;

/// Boxed future returned by the object-safe collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Behaviour when an update request arrives while a refresh is already
/// pending for the same category.
///
/// - `Coalesce`: keep the armed timer; the request folds into it (default).
/// - `Restart`: cancel the armed timer and arm a new one, so the debounce
///   window restarts from the latest request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingBehaviour {
    #[default]
    Coalesce,
    Restart,
}

impl FromStr for PendingBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coalesce" => Ok(PendingBehaviour::Coalesce),
            "restart" => Ok(PendingBehaviour::Restart),
            other => Err(format!(
                "invalid pending_behaviour: {other} (expected \"coalesce\" or \"restart\")"
            )),
        }
    }
}
