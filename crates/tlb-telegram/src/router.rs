//! Bot wiring: messenger construction, startup probe, HTTP listener,
//! refresh loop, and the teloxide dispatcher.

use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::sync::oneshot;

use tlb_core::{
    config::Config,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    refresh::RefreshLoop,
    store::{BoardStore, SetupStore},
};
use tlb_http::ApiState;

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub board: BoardStore,
    pub setup: SetupStore,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let mut bot = Bot::new(cfg.bot_token.clone());
    if let Some(raw) = &cfg.api_url {
        match reqwest::Url::parse(raw) {
            Ok(url) => bot = bot.set_api_url(url),
            Err(e) => tracing::warn!("ignoring invalid TELEGRAM_API_URL: {e}"),
        }
    }

    let board = BoardStore::new(cfg.board_file.clone());
    let setup = SetupStore::new(cfg.setup_file.clone());

    // Wrap the raw messenger with a throttling decorator so refresh-cycle
    // edit bursts stay under Telegram's flood limits.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    // The refresh task is spawned up front but blocks on the readiness
    // signal; it only ticks once the connection probe below succeeds.
    let refresh = RefreshLoop::new(cfg.clone(), board.clone(), setup.clone(), messenger.clone());
    let (ready_tx, ready_rx) = oneshot::channel();
    refresh.start(ready_rx).await;

    let me = bot.get_me().await?;
    tracing::info!("logged in as @{}", me.username());

    {
        let api = ApiState {
            api_key: cfg.api_key.clone(),
            board: board.clone(),
        };
        let port = cfg.http_port;
        tokio::spawn(async move {
            if let Err(e) = tlb_http::serve(api, port).await {
                tracing::error!("HTTP API failed: {e}");
            }
        });
    }

    let _ = ready_tx.send(());

    let state = Arc::new(AppState {
        cfg,
        board,
        setup,
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
