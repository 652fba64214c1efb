use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use cloudtune_pipeline::Orchestrator;

use crate::handlers;

/// Everything the handlers need, shared read-only across updates.
pub struct BotContext {
    pub orchestrator: Arc<Orchestrator>,
    pub allow_list: Vec<u64>,
    pub temp_dir: PathBuf,
    pub cleanup_max_age: Duration,
}

/// Connect the bot and start the long-polling loop.
///
/// Spawns a background task that processes updates until the returned
/// `CancellationToken` is cancelled.
pub async fn start_polling(
    token: &Secret<String>,
    ctx: Arc<BotContext>,
) -> anyhow::Result<CancellationToken> {
    // Client timeout must exceed the long-polling timeout (30s) so the HTTP
    // client doesn't abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(45))
        .build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    // Verify credentials and get the bot identity.
    let me = bot.get_me().await?;

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    // Register slash commands for autocomplete in Telegram clients.
    let commands = vec![
        BotCommand::new("start", "Greeting and quick intro"),
        BotCommand::new("help", "Show usage"),
        BotCommand::new("cleanup", "Delete old temporary files"),
    ];
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    tokio::spawn(async move {
        info!("starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            if cancel_clone.is_cancelled() {
                info!("telegram polling stopped");
                break;
            }

            let result = bot
                .get_updates()
                .offset(offset)
                .timeout(30)
                .allowed_updates(vec![AllowedUpdate::Message])
                .await;

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                if let Err(e) = handlers::handle_message(&bot, &ctx, msg).await {
                                    error!(error = %e, "error handling telegram message");
                                }
                            },
                            other => {
                                debug!("ignoring non-message update: {other:?}");
                            },
                        }
                    }
                },
                Err(e) => {
                    // Another bot instance is polling with the same token;
                    // continuing would just fight over updates.
                    if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                        error!(
                            "telegram polling stopped: another instance is already running with this token"
                        );
                        cancel_clone.cancel();
                        break;
                    }

                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                },
            }
        }
    });

    Ok(cancel)
}
