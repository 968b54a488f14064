// src/names/mod.rs

//! Player display-name lookup.
//!
//! The lookup service is an external collaborator. The scheduler and the
//! executor only need [`display_names`]; a failed lookup is reported as a
//! [`NameLookupError`] and callers degrade to "no names".

use std::collections::HashMap;

use thiserror::Error;

use crate::types::{BoxFuture, PlayerId};

pub mod http;

pub use http::HttpNameLookup;

/// Field name of the display name in lookup requests.
pub const DISPLAY_NAME: &str = "display_name";

/// `player -> field -> value`.
pub type PlayerFields = HashMap<PlayerId, HashMap<String, Option<String>>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameLookupError {
    #[error("name lookup timed out")]
    Timeout,

    #[error("name service returned {code}: {detail}")]
    Status { code: u16, detail: String },

    #[error("name lookup transport error: {0}")]
    Transport(String),

    #[error("invalid name lookup request: {0}")]
    InvalidRequest(&'static str),
}

/// Query interface of the name service.
pub trait NameLookup: Send + Sync {
    /// Request `fields` for every player in `players`.
    ///
    /// Both lists must be non-empty.
    fn query<'a>(
        &'a self,
        players: &'a [PlayerId],
        fields: &'a [&'a str],
    ) -> BoxFuture<'a, Result<PlayerFields, NameLookupError>>;
}

/// Resolve display names for `players`.
///
/// Players without a known name are left out of the map. An empty player
/// list never reaches the service.
pub async fn display_names(
    lookup: &dyn NameLookup,
    players: &[PlayerId],
) -> Result<HashMap<PlayerId, String>, NameLookupError> {
    if players.is_empty() {
        return Ok(HashMap::new());
    }

    let fields = [DISPLAY_NAME];
    let response = lookup.query(players, &fields).await?;

    Ok(response
        .into_iter()
        .filter_map(|(player, mut data)| {
            data.remove(DISPLAY_NAME)
                .flatten()
                .map(|name| (player, name))
        })
        .collect())
}
