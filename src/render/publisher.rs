// src/render/publisher.rs

use crate::errors::Result;
use crate::render::RenderedMessage;
use crate::types::BoxFuture;

/// Where a category is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub channel_id: u64,
    /// Message to edit. `None` means a new message is created.
    pub message_id: Option<u64>,
}

/// Result of a successful publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Message that now holds the content (differs from the requested one
    /// when the message had to be created).
    pub message_id: u64,
}

/// Chat platform client.
///
/// Implementations find or create the target message in the destination
/// channel, unarchiving the channel first if needed, and replace its
/// content.
pub trait Publisher: Send + Sync {
    fn publish<'a>(
        &'a self,
        destination: Destination,
        message: &'a RenderedMessage,
    ) -> BoxFuture<'a, Result<PublishReceipt>>;
}
