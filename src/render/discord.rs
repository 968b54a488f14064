// src/render/discord.rs

use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::errors::{Result, RosterError};
use crate::render::RenderedMessage;
use crate::render::publisher::{Destination, PublishReceipt, Publisher};
use crate::types::BoxFuture;

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    #[serde(default)]
    thread_metadata: Option<ThreadMetadata>,
}

#[derive(Debug, Deserialize)]
struct ThreadMetadata {
    #[serde(default)]
    archived: bool,
}

#[derive(Debug, Deserialize)]
struct MessageInfo {
    id: String,
}

/// [`Publisher`] talking to the Discord REST API with a bot token.
#[derive(Debug, Clone)]
pub struct DiscordPublisher {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl DiscordPublisher {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn auth(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn ensure_unarchived(&self, channel_id: u64) -> Result<()> {
        let url = format!("{}/channels/{}", self.api_base, channel_id);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.auth())
            .send()
            .await
            .map_err(publish_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RosterError::PublishError(format!(
                "channel {channel_id} not found"
            )));
        }
        let channel: ChannelInfo = response
            .error_for_status()
            .map_err(publish_error)?
            .json()
            .await
            .map_err(publish_error)?;

        if channel.thread_metadata.is_some_and(|meta| meta.archived) {
            info!(channel_id, "unarchiving destination thread");
            self.client
                .patch(&url)
                .header(AUTHORIZATION, self.auth())
                .json(&json!({ "archived": false }))
                .send()
                .await
                .map_err(publish_error)?
                .error_for_status()
                .map_err(publish_error)?;
        }
        Ok(())
    }

    /// Edit an existing message. `Ok(false)` if the message no longer exists.
    async fn edit_message(
        &self,
        channel_id: u64,
        message_id: u64,
        body: &serde_json::Value,
    ) -> Result<bool> {
        let url = format!(
            "{}/channels/{}/messages/{}",
            self.api_base, channel_id, message_id
        );
        let response = self
            .client
            .patch(&url)
            .header(AUTHORIZATION, self.auth())
            .json(body)
            .send()
            .await
            .map_err(publish_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status().map_err(publish_error)?;
        Ok(true)
    }

    async fn create_message(&self, channel_id: u64, body: &serde_json::Value) -> Result<u64> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let created: MessageInfo = self
            .client
            .post(&url)
            .header(AUTHORIZATION, self.auth())
            .json(body)
            .send()
            .await
            .map_err(publish_error)?
            .error_for_status()
            .map_err(publish_error)?
            .json()
            .await
            .map_err(publish_error)?;

        created.id.parse().map_err(|_| {
            RosterError::PublishError(format!("unexpected message id '{}'", created.id))
        })
    }

    async fn publish_inner(
        &self,
        destination: Destination,
        message: &RenderedMessage,
    ) -> Result<PublishReceipt> {
        self.ensure_unarchived(destination.channel_id).await?;

        let body = json!({ "content": "", "embeds": [message] });

        if let Some(message_id) = destination.message_id {
            if self
                .edit_message(destination.channel_id, message_id, &body)
                .await?
            {
                debug!(channel_id = destination.channel_id, message_id, "edited message");
                return Ok(PublishReceipt { message_id });
            }
            info!(
                channel_id = destination.channel_id,
                message_id, "target message missing; creating a new one"
            );
        }

        let message_id = self.create_message(destination.channel_id, &body).await?;
        info!(channel_id = destination.channel_id, message_id, "created message");
        Ok(PublishReceipt { message_id })
    }
}

fn publish_error(err: reqwest::Error) -> RosterError {
    RosterError::PublishError(err.to_string())
}

impl Publisher for DiscordPublisher {
    fn publish<'a>(
        &'a self,
        destination: Destination,
        message: &'a RenderedMessage,
    ) -> BoxFuture<'a, Result<PublishReceipt>> {
        Box::pin(self.publish_inner(destination, message))
    }
}
