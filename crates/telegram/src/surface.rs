use std::time::Duration;

use {
    async_trait::async_trait,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{ChatId, MessageId},
    },
    tracing::warn,
};

use cloudtune_pipeline::{ChatSurface, MessageRef};

const RETRY_AFTER_MAX_RETRIES: usize = 2;

/// [`ChatSurface`] bound to one Telegram chat.
pub struct TelegramChat {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramChat {
    #[must_use]
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ChatSurface for TelegramChat {
    async fn post(&self, text: &str) -> anyhow::Result<MessageRef> {
        let mut retries = 0;
        loop {
            match self.bot.send_message(self.chat_id, text).await {
                Ok(message) => return Ok(MessageRef(message.id.0.to_string())),
                Err(e) => wait_or_bail(&e, &mut retries).await?,
            }
        }
    }

    async fn edit(&self, message: &MessageRef, text: &str) -> anyhow::Result<()> {
        let message_id = MessageId(message.0.parse::<i32>()?);
        let mut retries = 0;
        loop {
            match self
                .bot
                .edit_message_text(self.chat_id, message_id, text)
                .await
            {
                Ok(_) => return Ok(()),
                // Telegram rejects edits with identical content; the edit is
                // idempotent from our point of view.
                Err(e) if is_message_not_modified_error(&e) => return Ok(()),
                Err(e) => wait_or_bail(&e, &mut retries).await?,
            }
        }
    }
}

/// Honor Telegram's RetryAfter rate limiting a bounded number of times,
/// then give up with the original error.
async fn wait_or_bail(error: &RequestError, retries: &mut usize) -> anyhow::Result<()> {
    let Some(wait) = retry_after_duration(error) else {
        anyhow::bail!("telegram request failed: {error}");
    };
    if *retries >= RETRY_AFTER_MAX_RETRIES {
        anyhow::bail!("telegram rate limit persisted after {retries} retries: {error}");
    }
    *retries += 1;
    warn!(retry_after_secs = wait.as_secs(), retries, "telegram rate limited, waiting");
    tokio::time::sleep(wait).await;
    Ok(())
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

fn is_message_not_modified_error(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::MessageNotModified))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_modified_is_detected() {
        assert!(is_message_not_modified_error(&RequestError::Api(
            ApiError::MessageNotModified
        )));
        assert!(!is_message_not_modified_error(&RequestError::Api(
            ApiError::MessageToEditNotFound
        )));
    }

    #[test]
    fn only_retry_after_yields_a_wait() {
        assert!(retry_after_duration(&RequestError::Api(ApiError::MessageNotModified)).is_none());
    }
}
