use std::sync::Arc;

use {
    teloxide::prelude::*,
    tracing::{debug, error, info, warn},
};

use {
    cloudtune_media::workdir,
    cloudtune_pipeline::{ChatSurface, is_authorized, orchestrator::UNAUTHORIZED_TEXT},
};

use crate::{bot::BotContext, surface::TelegramChat};

const GREETING_TEXT: &str = "Welcome! Send me a YouTube link and I'll convert it to MP3.\n\
                             The result will be stored in your pCloud account.";

const HELP_TEXT: &str = "Just send me a YouTube link and I'll convert it to MP3.\n\
                         Commands:\n\
                         /start - Start the bot\n\
                         /help - Show this help message\n\
                         /cleanup - Clean up temporary files";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Help,
    Cleanup,
}

/// Handle one inbound message: a known command, or a URL submission.
pub async fn handle_message(bot: &Bot, ctx: &Arc<BotContext>, msg: Message) -> anyhow::Result<()> {
    let Some(text) = msg.text().map(str::to_owned) else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return Ok(());
    };
    let Some(user_id) = msg.from.as_ref().map(|u| u.id.0) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without sender");
        return Ok(());
    };

    let chat = TelegramChat::new(bot.clone(), msg.chat.id);

    match parse_command(&text) {
        Some(Command::Start) => {
            if !is_authorized(user_id, &ctx.allow_list) {
                warn!(user_id, "unauthorized /start");
                chat.post(UNAUTHORIZED_TEXT).await?;
                return Ok(());
            }
            chat.post(GREETING_TEXT).await?;
        },
        Some(Command::Help) => {
            // Silently ignored for unauthorized users.
            if !is_authorized(user_id, &ctx.allow_list) {
                return Ok(());
            }
            chat.post(HELP_TEXT).await?;
        },
        Some(Command::Cleanup) => {
            if !is_authorized(user_id, &ctx.allow_list) {
                return Ok(());
            }
            let dir = ctx.temp_dir.clone();
            let max_age = ctx.cleanup_max_age;
            let removed =
                tokio::task::spawn_blocking(move || workdir::cleanup_old_files(&dir, max_age))
                    .await??;
            info!(user_id, removed, "cleanup command finished");
            chat.post("Cleanup completed!").await?;
        },
        None if text.starts_with('/') => {
            debug!(user_id, text, "ignoring unknown command");
        },
        None => {
            // Free text is a URL submission. Run it as its own task so the
            // polling loop keeps serving other chats while this request is
            // in flight.
            let orchestrator = Arc::clone(&ctx.orchestrator);
            let surface: Arc<dyn ChatSurface> = Arc::new(chat);
            tokio::spawn(async move {
                let outcome = orchestrator.handle(user_id, &text, surface).await;
                if let cloudtune_pipeline::RequestOutcome::Failure(ref failure) = outcome {
                    error!(user_id, kind = ?failure.kind, message = %failure.message, "request failed");
                }
            });
        },
    }

    Ok(())
}

/// Parse a leading slash command, tolerating the `@botname` suffix Telegram
/// appends in group chats.
fn parse_command(text: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    let command = command.split('@').next().unwrap_or(command);

    match command {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "cleanup" => Some(Command::Cleanup),
        _ => None,
    }
}
