//! Telegram channel — long-polls the Bot API for updates.
//!
//! Inbound: `getUpdates` long-polling, text messages only. Outbound:
//! `sendMessage` and `sendDocument`. API failures are classified into
//! [`DeliveryError`] kinds so callers can decide whether to retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::channels::{Channel, IncomingMessage, MessageSink, MessageStream, OutgoingResponse};
use crate::error::{ChannelError, DeliveryError};

/// Long-poll timeout passed to `getUpdates`, in seconds.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll before trying again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    client: reqwest::Client,
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// Call a JSON Bot API method and return its `result`.
    async fn call(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DeliveryError> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| DeliveryError::other(format!("{method}: {e}")))?;

        read_api_response(method, resp).await
    }

    /// Send a text message. `parse_mode` is `None` for plain text.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = serde_json::Value::String(mode.to_string());
        }

        self.call("sendMessage", &body).await.map(|_| ())
    }

    /// Send Markdown, retrying once as plain text if Telegram can't parse it.
    async fn send_markdown(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        match self.send_message(chat_id, text, Some("Markdown")).await {
            Err(e) if e.kind == crate::error::DeliveryErrorKind::BadRequest => {
                tracing::warn!(
                    error = %e,
                    "Telegram sendMessage with Markdown failed; retrying without parse_mode"
                );
                self.send_message(chat_id, text, None).await
            }
            other => other,
        }
    }

    /// Send a document from bytes (in-memory).
    pub async fn send_document_bytes(
        &self,
        chat_id: i64,
        file_bytes: Vec<u8>,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<(), DeliveryError> {
        let part = Part::bytes(file_bytes).file_name(file_name.to_string());

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        if let Some(cap) = caption {
            form = form.text("caption", cap.to_string());
        }

        let resp = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::other(format!("sendDocument: {e}")))?;

        read_api_response("sendDocument", resp).await?;

        tracing::info!(chat_id, file_name, "Telegram document sent");
        Ok(())
    }

    /// Drop any configured webhook so `getUpdates` polling is allowed.
    async fn delete_webhook(&self) -> Result<(), DeliveryError> {
        self.call(
            "deleteWebhook",
            &serde_json::json!({ "drop_pending_updates": true }),
        )
        .await
        .map(|_| ())
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        self.delete_webhook()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("deleteWebhook failed: {e}"),
            })?;

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let url = self.api_url("getUpdates");
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        continue;
                    }
                };

                let Some(results) = data.get("result").and_then(serde_json::Value::as_array)
                else {
                    tracing::warn!(response = %data, "Telegram getUpdates returned no result");
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    continue;
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64)
                    {
                        offset = uid + 1;
                    }

                    let Some(incoming) = parse_update(update) else {
                        continue;
                    };

                    if tx.send(incoming).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let result = if response.markdown {
            self.send_markdown(msg.chat_id, &response.content).await
        } else {
            self.send_message(msg.chat_id, &response.content, None).await
        };
        result.map_err(ChannelError::from)
    }

    async fn send_document(
        &self,
        msg: &IncomingMessage,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.send_document_bytes(msg.chat_id, bytes, file_name, caption)
            .await
            .map_err(ChannelError::from)
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        self.call("getMe", &serde_json::json!({}))
            .await
            .map(|_| ())
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe failed: {e}"),
            })
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl MessageSink for TelegramChannel {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.send_message(chat_id, text, None).await
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(token: &SecretString, method: &str) -> String {
    format!("https://api.telegram.org/bot{}/{method}", token.expose_secret())
}

/// Read a Bot API response, returning `result` or a classified error.
async fn read_api_response(
    method: &str,
    resp: reqwest::Response,
) -> Result<serde_json::Value, DeliveryError> {
    let status = resp.status().as_u16();
    let body = resp
        .text()
        .await
        .map_err(|e| DeliveryError::other(format!("{method}: failed to read body: {e}")))?;

    match serde_json::from_str::<ApiResponse>(&body) {
        Ok(api) if api.ok => Ok(api.result.unwrap_or(serde_json::Value::Null)),
        Ok(api) => Err(classify_api_error(status, &api)),
        Err(_) => Err(DeliveryError::other(format!(
            "{method}: HTTP {status}, unparseable body: {body}"
        ))),
    }
}

/// Map a failed Bot API response to a delivery error kind.
fn classify_api_error(http_status: u16, api: &ApiResponse) -> DeliveryError {
    let code = api.error_code.unwrap_or(http_status);
    let description = api
        .description
        .clone()
        .unwrap_or_else(|| format!("HTTP {code}"));

    match code {
        429 => {
            let secs = api
                .parameters
                .as_ref()
                .and_then(|p| p.retry_after)
                .unwrap_or(0);
            DeliveryError::rate_limited(Duration::from_secs(secs), description)
        }
        403 => DeliveryError::forbidden(description),
        400 => DeliveryError::bad_request(description),
        _ => DeliveryError::other(format!("{code}: {description}")),
    }
}

/// Turn one `getUpdates` entry into an inbound message.
///
/// Returns `None` for anything that is not a text message from a user.
fn parse_update(update: &serde_json::Value) -> Option<IncomingMessage> {
    let message = update.get("message")?;
    let text = message.get("text").and_then(serde_json::Value::as_str)?;

    let from = message.get("from")?;
    let user_id = from.get("id").and_then(serde_json::Value::as_i64)?;
    let handle = from.get("username").and_then(serde_json::Value::as_str);

    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(user_id);

    Some(IncomingMessage::new("telegram", user_id, chat_id, text).with_handle(handle))
}

// ── Tests ───────────────────────────────────────────────────────────
