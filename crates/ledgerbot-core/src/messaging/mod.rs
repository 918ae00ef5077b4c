//! Outbound messaging: the transport port and helpers built on it.

pub mod port;
pub mod throttled;
pub mod types;

use crate::{
    chunking::split_html,
    domain::{ChatId, MessageRef},
    Result,
};

use port::MessagingPort;

/// Send `html` as one or more messages of at most `limit` characters.
///
/// Cuts never land inside an entity or tag, so each piece parses as HTML.
/// Pieces go out strictly in order, each send awaited before the next. The
/// first failure stops delivery and is returned; nothing is retried here.
pub async fn send_chunked(
    port: &dyn MessagingPort,
    chat_id: ChatId,
    html: &str,
    limit: usize,
) -> Result<Vec<MessageRef>> {
    let limit = limit.min(port.capabilities().max_message_len);
    let mut sent = Vec::new();
    for piece in split_html(html, limit) {
        sent.push(port.send_html(chat_id, piece).await?);
    }
    Ok(sent)
}
