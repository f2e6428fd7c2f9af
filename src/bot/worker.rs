//! Per-user worker — owns one user's session and processes their messages in
//! arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::bot::commands::{Submission, SubmissionParser};
use crate::bot::export;
use crate::channels::{Channel, IncomingMessage, OutgoingResponse};
use crate::error::Error;
use crate::intake::{Answers, Input, IntakeSession, Transition, prompts};
use crate::notify::Dispatcher;
use crate::store::RegistrationStore;

/// Shared dependencies handed to every worker.
pub struct BotDeps {
    pub channel: Arc<dyn Channel>,
    pub store: Arc<dyn RegistrationStore>,
    pub dispatcher: Arc<Dispatcher>,
    /// The only user allowed to `/export`.
    pub admin_id: Option<i64>,
}

impl BotDeps {
    /// Whether `user_id` is the configured admin. No admin means nobody is.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_id == Some(user_id)
    }
}

pub struct UserWorker {
    user_id: i64,
    session: IntakeSession,
    deps: Arc<BotDeps>,
}

impl UserWorker {
    pub fn new(user_id: i64, deps: Arc<BotDeps>) -> Self {
        Self {
            user_id,
            session: IntakeSession::new(),
            deps,
        }
    }

    pub fn session(&self) -> &IntakeSession {
        &self.session
    }

    /// Drain the queue until every sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<IncomingMessage>) {
        debug!(user_id = self.user_id, "Worker started");
        while let Some(msg) = rx.recv().await {
            if let Err(e) = self.handle(&msg).await {
                error!(
                    user_id = self.user_id,
                    step = %self.session.step(),
                    error = %e,
                    "Failed to handle message"
                );
            }
        }
        debug!(user_id = self.user_id, "Worker stopped");
    }

    /// Handle one message from this worker's user.
    pub async fn handle(&mut self, msg: &IncomingMessage) -> Result<(), Error> {
        match SubmissionParser::parse(&msg.content) {
            Submission::Export => export::handle_export(&self.deps, msg).await,
            Submission::Start => self.advance(msg, Input::Start).await,
            Submission::Cancel => self.advance(msg, Input::Cancel).await,
            Submission::UserInput { content } => self.advance(msg, Input::Text(&content)).await,
        }
    }

    async fn advance(&mut self, msg: &IncomingMessage, input: Input<'_>) -> Result<(), Error> {
        match self.session.handle(input) {
            Transition::Ignored => {
                debug!(user_id = self.user_id, "Text outside a registration, ignored");
                Ok(())
            }
            Transition::Prompt(prompt) => {
                self.reply(msg, prompts::render(prompt)).await;
                Ok(())
            }
            Transition::Complete(answers) => self.complete(msg, answers).await,
        }
    }

    /// Commit, confirm, then announce.
    ///
    /// A failed write leaves the session on the games question with its
    /// answers, so the user's next reply retries the commit.
    async fn complete(&mut self, msg: &IncomingMessage, answers: Answers) -> Result<(), Error> {
        let handle = msg.handle.as_deref();
        self.deps
            .store
            .upsert(self.user_id, handle, &answers)
            .await?;
        self.session.finish();
        info!(user_id = self.user_id, "Registration saved");

        self.reply(msg, prompts::confirmation(&answers)).await;

        let summary = prompts::group_summary(self.user_id, handle, &answers);
        self.deps.dispatcher.broadcast(&summary).await;
        Ok(())
    }

    async fn reply(&self, msg: &IncomingMessage, response: OutgoingResponse) {
        if let Err(e) = self.deps.channel.respond(msg, response).await {
            warn!(user_id = self.user_id, error = %e, "Failed to send reply");
        }
    }
}
