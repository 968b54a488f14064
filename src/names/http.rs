// src/names/http.rs

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::names::{NameLookup, NameLookupError, PlayerFields};
use crate::types::{BoxFuture, PlayerId};

/// Error body returned by the name service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: u16,
    detail: String,
}

/// HTTP client of the player data service (`GET <base>/query/`).
#[derive(Debug, Clone)]
pub struct HttpNameLookup {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNameLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, NameLookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NameLookupError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn query_url(&self) -> String {
        format!("{}/query/", self.base_url.trim_end_matches('/'))
    }

    async fn query_inner(
        &self,
        players: &[PlayerId],
        fields: &[&str],
    ) -> Result<PlayerFields, NameLookupError> {
        if fields.is_empty() {
            return Err(NameLookupError::InvalidRequest("fields list cannot be empty"));
        }
        if players.is_empty() {
            return Err(NameLookupError::InvalidRequest("players list cannot be empty"));
        }

        let mut params: Vec<(&str, &str)> = Vec::with_capacity(fields.len() + players.len());
        params.extend(fields.iter().map(|f| ("fields", *f)));
        params.extend(players.iter().map(|p| ("players", p.as_str())));

        debug!(players = players.len(), "querying name service");
        let response = self
            .client
            .get(self.query_url())
            .query(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(map_transport_error)?;
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => NameLookupError::Status {
                    code: err.code,
                    detail: err.detail,
                },
                Err(_) => NameLookupError::Status {
                    code: status.as_u16(),
                    detail: body,
                },
            });
        }

        response
            .json::<PlayerFields>()
            .await
            .map_err(map_transport_error)
    }
}

fn map_transport_error(err: reqwest::Error) -> NameLookupError {
    if err.is_timeout() {
        NameLookupError::Timeout
    } else {
        NameLookupError::Transport(err.to_string())
    }
}

impl NameLookup for HttpNameLookup {
    fn query<'a>(
        &'a self,
        players: &'a [PlayerId],
        fields: &'a [&'a str],
    ) -> BoxFuture<'a, Result<PlayerFields, NameLookupError>> {
        Box::pin(self.query_inner(players, fields))
    }
}
