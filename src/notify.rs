//! Notification dispatcher — delivers registration summaries to the group.
//!
//! A single rate-limit retry is allowed per send; every other failure is
//! logged and reported as `false`. When the group send fails, the summary is
//! re-routed to the admin chat with a warning prefix.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::channels::MessageSink;
use crate::error::{DeliveryError, DeliveryErrorKind};
use crate::intake::prompts::FALLBACK_PREFIX;

/// Extra wait added on top of the transport's `retry_after`.
const RETRY_MARGIN: Duration = Duration::from_secs(1);

pub struct Dispatcher {
    sink: Arc<dyn MessageSink>,
    group_chat_id: i64,
    fallback_chat_id: Option<i64>,
}

impl Dispatcher {
    pub fn new(
        sink: Arc<dyn MessageSink>,
        group_chat_id: i64,
        fallback_chat_id: Option<i64>,
    ) -> Self {
        Self {
            sink,
            group_chat_id,
            fallback_chat_id,
        }
    }

    /// Deliver `text` to `chat_id`. Returns whether it got through.
    pub async fn send(&self, chat_id: i64, text: &str) -> bool {
        match self.sink.send_text(chat_id, text).await {
            Ok(()) => true,
            Err(e) if e.kind == DeliveryErrorKind::RateLimited => {
                let wait = e.retry_after.unwrap_or_default() + RETRY_MARGIN;
                warn!(chat_id, wait_secs = wait.as_secs_f64(), "Rate limited, retrying once");
                tokio::time::sleep(wait).await;

                match self.sink.send_text(chat_id, text).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(chat_id, error = %e, "Send failed after rate-limit retry");
                        false
                    }
                }
            }
            Err(e) => {
                log_failure(chat_id, text, &e);
                false
            }
        }
    }

    /// Send to the group; on failure, forward to the admin chat instead.
    ///
    /// Returns the outcome of the group send.
    pub async fn broadcast(&self, text: &str) -> bool {
        if self.send(self.group_chat_id, text).await {
            info!(chat_id = self.group_chat_id, "Registration broadcast delivered");
            return true;
        }

        let Some(admin) = self.fallback_chat_id else {
            warn!("Group send failed and no admin is configured, summary dropped");
            return false;
        };

        let fallback = format!("{FALLBACK_PREFIX}{text}");
        if self.send(admin, &fallback).await {
            info!(admin_chat_id = admin, "Registration re-routed to admin");
        } else {
            error!(admin_chat_id = admin, "Admin fallback failed, summary dropped");
        }
        false
    }
}

fn log_failure(chat_id: i64, text: &str, e: &DeliveryError) {
    match e.kind {
        DeliveryErrorKind::Forbidden => {
            error!(chat_id, error = %e, "Bot has no rights in chat");
        }
        DeliveryErrorKind::BadRequest => {
            error!(chat_id, error = %e, payload = text, "Request rejected");
        }
        _ => {
            error!(chat_id, error = %e, "Send failed");
        }
    }
}
