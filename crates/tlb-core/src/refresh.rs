//! Periodic in-place refresh of the tracked leaderboard messages.
//!
//! One background task: wait for Telegram connectivity, then every interval
//! re-read the setup and board documents and re-render every tracked message.
//! Edit failures are isolated per category so one deleted message cannot
//! starve the rest, and a failed cycle never kills the loop.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    board,
    config::Config,
    domain::{ChatId, MessageId, MessageRef},
    messaging::port::MessagingPort,
    render::leaderboard_html,
    store::{BoardStore, SetupStore},
    Result,
};

#[derive(Clone)]
pub struct RefreshLoop {
    inner: Arc<RefreshInner>,
}

struct RefreshInner {
    cfg: Arc<Config>,
    board: BoardStore,
    setup: SetupStore,
    messenger: Arc<dyn MessagingPort>,
    state: Mutex<LoopState>,
}

#[derive(Default)]
struct LoopState {
    handle: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
}

impl RefreshLoop {
    pub fn new(
        cfg: Arc<Config>,
        board: BoardStore,
        setup: SetupStore,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            inner: Arc::new(RefreshInner {
                cfg,
                board,
                setup,
                messenger,
                state: Mutex::new(LoopState::default()),
            }),
        }
    }

    /// Spawn the background task. Idempotent: a second call while the task is
    /// still alive does nothing.
    ///
    /// The task blocks on `ready` before its first cycle so we never try to
    /// edit messages before the Telegram connection is confirmed.
    pub async fn start(&self, ready: oneshot::Receiver<()>) {
        let mut st = self.inner.state.lock().await;
        if st
            .handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
        {
            return;
        }

        let cancel = CancellationToken::new();
        let this = self.clone();
        let cancel_for_task = cancel.clone();
        let handle = tokio::spawn(async move {
            this.run(ready, cancel_for_task).await;
        });

        st.cancel = Some(cancel);
        st.handle = Some(handle);
    }

    pub async fn is_running(&self) -> bool {
        let st = self.inner.state.lock().await;
        st.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Cancel the background task. Only used on process shutdown.
    pub async fn stop(&self) {
        let mut st = self.inner.state.lock().await;
        if let Some(tok) = st.cancel.take() {
            tok.cancel();
        }
        st.handle.take();
    }

    async fn run(&self, ready: oneshot::Receiver<()>, cancel: CancellationToken) {
        // A dropped sender means startup is aborting; never run blind.
        if ready.await.is_err() {
            return;
        }

        tracing::info!(
            "refresh loop started (interval {}s)",
            self.inner.cfg.refresh_interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.inner.cfg.refresh_interval) => {
                    if let Err(e) = self.run_cycle().await {
                        tracing::error!("refresh cycle failed: {e}");
                    }
                }
            }
        }
    }

    /// One timed pass over every tracked message. Public so callers can
    /// drive a cycle without waiting out the interval.
    pub async fn run_cycle(&self) -> Result<()> {
        let setup = self.inner.setup.load_or_default();
        let Some(channel_id) = setup.channel_id else {
            // Setup command has not run yet; nothing to refresh.
            return Ok(());
        };
        let channel = ChatId(channel_id);

        let board = self.inner.board.load_or_default();

        for (kind, &message_id) in &setup.message_ids {
            let html = leaderboard_html(kind, board::ranked(&board, kind));
            let msg = MessageRef {
                chat_id: channel,
                message_id: MessageId(message_id),
            };
            if let Err(e) = self.inner.messenger.edit_html(msg, &html).await {
                tracing::warn!("failed to refresh {kind}: {e}");
            }
        }

        Ok(())
    }
}
