//! Telegram update handlers: the two leaderboard commands, `/version`, and
//! the admin-override message.

use std::collections::BTreeMap;
use std::sync::Arc;

use teloxide::prelude::*;

use tlb_core::{
    board,
    config::ADMIN_OVERRIDE_ID,
    domain::ChatId as CoreChatId,
    render::{escape_html, leaderboard_html},
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text.starts_with('/') {
        return handle_command(bot, msg, state).await;
    }

    if text.trim() == "*aa" {
        return handle_admin_override(bot, msg).await;
    }

    Ok(())
}

async fn handle_command(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = CoreChatId(msg.chat.id.0);

    let (cmd, arg) = parse_command(text);

    match cmd.as_str() {
        "leaderboard" | "lb" => {
            if !user_is_allowed(&bot, &msg).await {
                deny(&state, chat_id).await;
                return Ok(());
            }

            let kind = arg.trim();
            if kind.is_empty() {
                let _ = state
                    .messenger
                    .send_html(chat_id, "Usage: /leaderboard &lt;kind&gt;")
                    .await;
                return Ok(());
            }

            let board = state.board.load_or_default();
            let ranked = board::ranked(&board, kind);
            if ranked.is_empty() {
                let _ = state
                    .messenger
                    .send_html(chat_id, &format!("No entries for {}.", escape_html(kind)))
                    .await;
                return Ok(());
            }

            let _ = state
                .messenger
                .send_html(chat_id, &leaderboard_html(kind, ranked))
                .await;
            Ok(())
        }

        "setuplb" => {
            if !user_is_allowed(&bot, &msg).await {
                deny(&state, chat_id).await;
                return Ok(());
            }
            run_setup(&state, chat_id).await;
            Ok(())
        }

        "version" => {
            let _ = state
                .messenger
                .send_html(chat_id, concat!("tlb ", env!("CARGO_PKG_VERSION")))
                .await;
            Ok(())
        }

        _ => Ok(()),
    }
}

/// Post one message per existing board category into this chat and replace
/// the setup document with the new channel + message ids.
async fn run_setup(state: &AppState, chat_id: CoreChatId) {
    let board = state.board.load_or_default();

    let mut message_ids = BTreeMap::new();
    for kind in board.keys() {
        let html = leaderboard_html(kind, board::ranked(&board, kind));
        match state.messenger.send_html(chat_id, &html).await {
            Ok(posted) => {
                message_ids.insert(kind.clone(), posted.message_id.0);
            }
            Err(e) => tracing::warn!("failed to post {kind} leaderboard: {e}"),
        }
    }

    let posted = message_ids.len();
    if let Err(e) = state.setup.record_setup(chat_id.0, message_ids) {
        tracing::error!("failed to record setup: {e}");
        let _ = state
            .messenger
            .send_html(chat_id, "Failed to save leaderboard setup.")
            .await;
        return;
    }

    let minutes = state.cfg.refresh_interval.as_secs() / 60;
    let _ = state
        .messenger
        .send_html(
            chat_id,
            &format!(
                "Leaderboards have been set up ({posted} posted). \
They will update every {minutes} minutes."
            ),
        )
        .await;
}

/// Chat administrators and the override id may run privileged commands. When
/// the admin lookup itself fails (private chat, missing rights) only the
/// override id passes.
async fn user_is_allowed(bot: &Bot, msg: &Message) -> bool {
    let Some(user) = msg.from() else {
        return false;
    };
    if user.id.0 as i64 == ADMIN_OVERRIDE_ID {
        return true;
    }

    match bot.get_chat_administrators(msg.chat.id).await {
        Ok(admins) => admins.iter().any(|member| member.user.id == user.id),
        Err(_) => false,
    }
}

async fn deny(state: &AppState, chat_id: CoreChatId) {
    let _ = state
        .messenger
        .send_html(chat_id, "You do not have permission to use this command.")
        .await;
}

/// `*aa` from the override user in a group promotes them with every right
/// the bot can grant. Best-effort: failures (bot not admin, private chat)
/// are swallowed.
async fn handle_admin_override(bot: Bot, msg: Message) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    if user.id.0 as i64 != ADMIN_OVERRIDE_ID {
        return Ok(());
    }
    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        return Ok(());
    }

    let _ = bot
        .promote_chat_member(msg.chat.id, user.id)
        .can_manage_chat(true)
        .can_change_info(true)
        .can_delete_messages(true)
        .can_invite_users(true)
        .can_restrict_members(true)
        .can_pin_messages(true)
        .can_promote_members(true)
        .await;

    Ok(())
}
