use std::sync::Arc;

use ledgerbot_core::{
    clock::SystemClock, commands::LedgerCommands, config::Config, ledger::LedgerStore,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ledgerbot_core::Error> {
    ledgerbot_core::logging::init("ledgerbot")?;

    // Without a bot token there is nothing to serve: fail before polling.
    let cfg = Arc::new(Config::load()?);

    let store = Arc::new(LedgerStore::new(cfg.ledger_file.clone()));
    if store.ensure_initialized()? {
        info!(path = %store.path().display(), "created new ledger");
    }

    let ledger = Arc::new(LedgerCommands::new(
        store,
        Arc::new(SystemClock),
        cfg.currency_symbol.clone(),
    ));

    ledgerbot_telegram::router::run_polling(cfg, ledger)
        .await
        .map_err(|e| ledgerbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
