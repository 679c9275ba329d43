use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    Result,
};

/// Cross-messenger port.
///
/// Telegram is the first implementation. The refresh loop and the command
/// handlers only ever send and edit HTML messages, so that is the whole
/// surface; richer adapters can grow behind the same trait.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;
    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()>;
}
