use async_trait::async_trait;

/// Platform handle to one already-sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef(pub String);

/// The two chat primitives the pipeline depends on: post a new message and
/// edit an existing one in place. The Telegram crate provides the concrete
/// implementation; tests record calls in memory.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    async fn post(&self, text: &str) -> anyhow::Result<MessageRef>;

    /// Edit a previously posted message. Implementations treat a no-op edit
    /// (unchanged text) as success.
    async fn edit(&self, message: &MessageRef, text: &str) -> anyhow::Result<()>;
}
