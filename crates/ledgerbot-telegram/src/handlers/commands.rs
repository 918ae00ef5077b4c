use teloxide::prelude::*;
use tracing::{error, warn};

use ledgerbot_core::{
    commands::parse_command,
    domain::ChatId,
    formatting::escape_html,
    messaging::send_chunked,
    Error,
};

use crate::router::AppState;

pub async fn handle_command(state: &AppState, chat_id: i64, text: &str) -> ResponseResult<()> {
    let (cmd, args) = parse_command(text);

    // Ledger calls do blocking file I/O (append ends in an fsync).
    let ledger = state.ledger.clone();
    let command = cmd.clone();
    let outcome = tokio::task::spawn_blocking(move || ledger.execute(&command, &args))
        .await
        .unwrap_or_else(|e| Err(Error::External(format!("command task failed: {e}"))));

    let reply = match outcome {
        Ok(reply) => reply,
        Err(e) => match e.user_message() {
            Some(msg) => escape_html(msg),
            None => {
                error!(command = %cmd, error = %e, "command failed");
                format!("⚠️ /{} failed: {}", escape_html(&cmd), escape_html(&e.to_string()))
            }
        },
    };

    if let Err(e) = send_chunked(
        state.messenger.as_ref(),
        ChatId(chat_id),
        &reply,
        state.cfg.telegram_safe_limit,
    )
    .await
    {
        warn!(chat_id, command = %cmd, error = %e, "failed to deliver reply");
    }
    Ok(())
}
