//! Telegram update handlers.
//!
//! Commands are run against the ledger under a per-chat lock; anything that
//! is not a command gets a pointer to `/start`.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::warn;

use ledgerbot_core::domain::UserId;
use ledgerbot_core::security::is_authorized;

use crate::router::AppState;
mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        warn!(chat_id, user_id = ?user_id.map(|u| u.0), "unauthorized message");
        let _ = bot
            .send_message(
                msg.chat.id,
                "Unauthorized. Contact the bot owner for access.",
            )
            .await;
        return Ok(());
    }

    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        let _guard = state.chat_locks.lock_chat(chat_id).await;
        return commands::handle_command(&state, chat_id, text).await;
    }

    let _ = bot
        .send_message(msg.chat.id, "Send /start to see the available commands.")
        .await;
    Ok(())
}
