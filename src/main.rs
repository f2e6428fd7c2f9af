use std::sync::Arc;

use anyhow::Context;

use reg_intake::bot::{BotDeps, Registrar};
use reg_intake::channels::{Channel, TelegramChannel};
use reg_intake::config::BotConfig;
use reg_intake::notify::Dispatcher;
use reg_intake::store::{LibSqlBackend, RegistrationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;

    eprintln!("📝 Reg Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Group chat: {}", config.group_chat_id);
    eprintln!(
        "   Admin: {}",
        config
            .admin_id
            .map_or_else(|| "none (export disabled)".to_string(), |id| id.to_string())
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn RegistrationStore> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );

    // ── Telegram ─────────────────────────────────────────────────────────
    let telegram = Arc::new(TelegramChannel::new(config.bot_token.clone()));
    telegram
        .health_check()
        .await
        .context("Telegram health check failed")?;

    let dispatcher = Arc::new(Dispatcher::new(
        telegram.clone(),
        config.group_chat_id,
        config.admin_id,
    ));

    let deps = BotDeps {
        channel: telegram,
        store,
        dispatcher,
        admin_id: config.admin_id,
    };

    Registrar::new(deps, config.session_idle_timeout)
        .run()
        .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}
