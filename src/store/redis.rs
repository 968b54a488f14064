// src/store/redis.rs

use std::collections::HashMap;

use futures::StreamExt;
use futures::stream::BoxStream;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::{info, warn};

use crate::errors::Result;
use crate::store::StateStore;
use crate::types::BoxFuture;

/// [`StateStore`] backed by Redis.
///
/// Records are Redis hashes, so a field update is a single `HSET`.
/// Commands share one multiplexed connection; every subscription opens its
/// own pub/sub connection.
pub struct RedisStore {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("connected to redis store");
        Ok(Self { client, conn })
    }
}

impl StateStore for RedisStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>>> {
        let key = key.to_string();
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let value: Option<String> = conn.get(&key).await?;
            Ok(value)
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, Result<()>> {
        let key = key.to_string();
        let value = value.to_string();
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let _: () = conn.set(&key, &value).await?;
            Ok(())
        })
    }

    fn get_fields(&self, key: &str) -> BoxFuture<'_, Result<HashMap<String, String>>> {
        let key = key.to_string();
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let fields: HashMap<String, String> = conn.hgetall(&key).await?;
            Ok(fields)
        })
    }

    fn get_field(&self, key: &str, field: &str) -> BoxFuture<'_, Result<Option<String>>> {
        let key = key.to_string();
        let field = field.to_string();
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let value: Option<String> = conn.hget(&key, &field).await?;
            Ok(value)
        })
    }

    fn set_field(&self, key: &str, field: &str, value: &str) -> BoxFuture<'_, Result<()>> {
        let key = key.to_string();
        let field = field.to_string();
        let value = value.to_string();
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let _: () = conn.hset(&key, &field, &value).await?;
            Ok(())
        })
    }

    fn set_fields(&self, key: &str, fields: Vec<(String, String)>) -> BoxFuture<'_, Result<()>> {
        let key = key.to_string();
        let mut conn = self.conn.clone();
        Box::pin(async move {
            if fields.is_empty() {
                return Ok(());
            }
            let _: () = conn.hset_multiple(&key, fields.as_slice()).await?;
            Ok(())
        })
    }

    fn publish(&self, channel: &str, message: &str) -> BoxFuture<'_, Result<()>> {
        let channel = channel.to_string();
        let message = message.to_string();
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let _: () = conn.publish(&channel, &message).await?;
            Ok(())
        })
    }

    fn subscribe(&self, channel: &str) -> BoxFuture<'_, Result<BoxStream<'static, String>>> {
        let channel = channel.to_string();
        Box::pin(async move {
            let mut pubsub = self.client.get_async_pubsub().await?;
            pubsub.subscribe(&channel).await?;
            info!(channel = %channel, "subscribed to redis channel");

            let stream = pubsub
                .into_on_message()
                .filter_map(|msg| async move {
                    match msg.get_payload::<String>() {
                        Ok(payload) => Some(payload),
                        Err(err) => {
                            warn!(error = %err, "dropping non-UTF-8 pub/sub payload");
                            None
                        }
                    }
                })
                .boxed();
            Ok(stream)
        })
    }
}
