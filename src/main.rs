// Entry point of the appeal bot.
//
// **Architecture Overview:**
// - `core/` = Appeal lifecycle, violation history, sessions (platform-agnostic)
// - `infra/` = Implementations of core traits (SQLite, in-memory)
// - `discord/` = Discord adapters (notifier, buttons, slash commands)
// - `web/` = JSON API used by the appeal form
//
// This file loads configuration, wires the services together, starts the
// HTTP server and then runs the Discord client.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "web/web_layer.rs"]
mod web;

mod config;

use crate::config::Config;
use crate::core::appeals::AppealService;
use crate::core::history::HistoryService;
use crate::discord::appeals::interactions::handle_component;
use crate::discord::appeals::DiscordAppealNotifier;
use crate::discord::{Data, Error};
use crate::infra::appeals::SqliteAppealStore;
use crate::infra::reports::SqliteReportLedger;
use crate::infra::sessions::SqliteSessionStore;
use crate::web::WebState;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// Only button clicks on case messages matter here.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::InteractionCreate {
        interaction: serenity::Interaction::Component(component),
    } = event
    {
        if let Err(e) = handle_component(ctx, data, component).await {
            tracing::error!("Error handling component interaction: {}", e);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = Config::from_env()?;

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let appeal_store = SqliteAppealStore::open(&config.appeals_db.to_string_lossy())
        .await
        .context("Failed to open appeals database")?;
    let report_ledger = SqliteReportLedger::open(&config.reports_db.to_string_lossy())
        .await
        .context("Failed to open reports database")?;
    let session_store = SqliteSessionStore::open(&config.sessions_db.to_string_lossy())
        .await
        .context("Failed to open sessions database")?;

    // The notifier gets its own REST handle so the web server can post cases
    // before the gateway connection is up.
    let http = Arc::new(serenity::Http::new(&config.discord_token));
    let notifier = Arc::new(DiscordAppealNotifier::new(
        Arc::clone(&http),
        config.appeal_channel_id,
    ));
    if config.appeal_channel_id.is_none() {
        tracing::warn!("APPEAL_CHANNEL_ID is not set; submitted appeals cannot be posted");
    }

    let appeal_service = Arc::new(AppealService::new(
        appeal_store,
        notifier,
        config.appeal_config(),
    ));
    let history_service = Arc::new(HistoryService::new(report_ledger, config.history_limit));

    // ========================================================================
    // HTTP SERVER
    // ========================================================================

    let web_state = Arc::new(WebState {
        appeals: Arc::clone(&appeal_service),
        sessions: Arc::new(session_store),
    });
    let app = web::router(web_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!("Appeal API listening on port {}", config.port);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("HTTP server stopped: {}", e);
        }
    });

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let data = Data {
        appeals: appeal_service,
        history: history_service,
    };

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::commands::appeals::appeals()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered, bot is ready");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
