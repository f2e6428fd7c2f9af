//! Channel trait and the message types that flow through it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::{ChannelError, DeliveryError};

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// One inbound text message from a user.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that received the message.
    pub channel: String,
    /// Sender identity.
    pub user_id: i64,
    /// Sender's public handle (without `@`), if they have one.
    pub handle: Option<String>,
    /// Chat to answer in.
    pub chat_id: i64,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: i64, chat_id: i64, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id,
            handle: None,
            chat_id,
            content: content.into(),
            received_at: Utc::now(),
        }
    }

    pub fn with_handle(mut self, handle: Option<&str>) -> Self {
        self.handle = handle.filter(|h| !h.is_empty()).map(String::from);
        self
    }
}

/// A reply to the user who sent an [`IncomingMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
    /// Render as Markdown (channels fall back to plain text on parse errors).
    pub markdown: bool,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            markdown: false,
        }
    }

    pub fn markdown(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            markdown: true,
        }
    }
}

/// A conversational transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start listening; inbound messages arrive on the returned stream.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Reply in the chat the message came from.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Reply with a file attachment.
    async fn send_document(
        &self,
        msg: &IncomingMessage,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError>;
}

/// Sends plain text to an arbitrary chat, reporting failures by kind.
///
/// The notification dispatcher is written against this seam so retry and
/// fallback logic never depends on a particular transport.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_optional() {
        let msg = IncomingMessage::new("telegram", 7, 7, "hi").with_handle(Some("ann"));
        assert_eq!(msg.handle.as_deref(), Some("ann"));

        let msg = IncomingMessage::new("telegram", 7, 7, "hi").with_handle(Some(""));
        assert_eq!(msg.handle, None);
    }

    #[test]
    fn response_constructors() {
        assert!(!OutgoingResponse::text("a").markdown);
        assert!(OutgoingResponse::markdown("*a*").markdown);
    }
}
