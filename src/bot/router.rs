//! Dispatch loop — routes inbound messages to per-user workers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::bot::worker::{BotDeps, UserWorker};
use crate::channels::{IncomingMessage, MessageStream};
use crate::error::Error;

/// Upper bound on how often idle workers are swept.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

struct WorkerHandle {
    tx: mpsc::UnboundedSender<IncomingMessage>,
    last_seen: Instant,
    task: JoinHandle<()>,
}

/// Owns the worker table. Messages for one user are handled in order; different
/// users are handled concurrently.
pub struct Registrar {
    deps: Arc<BotDeps>,
    session_idle_timeout: Duration,
    workers: HashMap<i64, WorkerHandle>,
}

impl Registrar {
    pub fn new(deps: BotDeps, session_idle_timeout: Duration) -> Self {
        Self {
            deps: Arc::new(deps),
            session_idle_timeout,
            workers: HashMap::new(),
        }
    }

    /// Start the channel and run until Ctrl+C or the stream ends.
    pub async fn run(self) -> Result<(), Error> {
        let stream = self.deps.channel.start().await?;
        let channel = Arc::clone(&self.deps.channel);

        self.run_stream(stream).await;

        channel.shutdown().await?;
        Ok(())
    }

    /// Route every message from `stream`, then let the workers drain.
    pub async fn run_stream(mut self, mut stream: MessageStream) {
        let sweep_every =
            (self.session_idle_timeout / 2).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
        let mut sweep = tokio::time::interval(sweep_every);
        sweep.tick().await; // Skip immediate first tick

        tracing::info!(
            channel = self.deps.channel.name(),
            "Registration bot ready and listening"
        );

        loop {
            tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = stream.next() => {
                    match msg {
                        Some(m) => self.route(m),
                        None => {
                            tracing::info!("Message stream ended, shutting down...");
                            break;
                        }
                    }
                }
                _ = sweep.tick() => self.prune_idle(),
            }
        }

        self.drain().await;
    }

    fn route(&mut self, msg: IncomingMessage) {
        let user_id = msg.user_id;
        let now = Instant::now();

        let rejected = match self.workers.get_mut(&user_id) {
            Some(worker) => {
                worker.last_seen = now;
                worker.tx.send(msg).err().map(|e| e.0)
            }
            None => Some(msg),
        };

        // No worker yet, or its task died: start a fresh one.
        if let Some(msg) = rejected {
            let mut worker = self.spawn_worker(user_id);
            worker.last_seen = now;
            if worker.tx.send(msg).is_err() {
                tracing::error!(user_id, "New worker refused message");
            }
            self.workers.insert(user_id, worker);
        }
    }

    fn spawn_worker(&self, user_id: i64) -> WorkerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = UserWorker::new(user_id, Arc::clone(&self.deps));
        let task = tokio::spawn(worker.run(rx));
        WorkerHandle {
            tx,
            last_seen: Instant::now(),
            task,
        }
    }

    /// Drop workers idle for longer than the session timeout. A dropped
    /// worker finishes its queue and exits; its session is lost.
    fn prune_idle(&mut self) {
        let timeout = self.session_idle_timeout;
        let before = self.workers.len();
        self.workers.retain(|_, worker| worker.last_seen.elapsed() < timeout);

        let pruned = before - self.workers.len();
        if pruned > 0 {
            tracing::info!(pruned, active = self.workers.len(), "Pruned idle sessions");
        }
    }

    /// Close every queue and wait for the workers to finish what they hold.
    async fn drain(&mut self) {
        let tasks: Vec<JoinHandle<()>> = self
            .workers
            .drain()
            .map(|(_, worker)| worker.task)
            .collect();

        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Worker task failed");
            }
        }
    }

    pub fn active_workers(&self) -> usize {
        self.workers.len()
    }
}
