use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// User id that is always allowed to run privileged commands, independent of
/// chat-admin status. Also the only id the `*aa` promote handler listens to.
pub const ADMIN_OVERRIDE_ID: i64 = 972533051173240875;

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub api_url: Option<String>,

    // HTTP ingest API
    pub api_key: Option<String>,
    pub http_port: u16,

    // Persisted state
    pub board_file: PathBuf,
    pub setup_file: PathBuf,

    // Refresh loop
    pub refresh_interval: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let api_url = env_str("TELEGRAM_API_URL").and_then(non_empty);

        // Empty API_KEY means the ingest endpoints run without auth.
        let api_key = env_str("API_KEY").and_then(non_empty);
        let http_port = env_u16("PORT").unwrap_or(8080);

        let board_file =
            PathBuf::from(env_str("BOARD_FILE").unwrap_or("leaderboard.json".to_string()));
        let setup_file =
            PathBuf::from(env_str("SETUP_FILE").unwrap_or("leaderboard_setup.json".to_string()));

        let refresh_interval =
            Duration::from_secs(env_u64("REFRESH_INTERVAL_SECS").unwrap_or(600));

        Ok(Self {
            bot_token,
            api_url,
            api_key,
            http_port,
            board_file,
            setup_file,
            refresh_interval,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u16(key: &str) -> Option<u16> {
    env_str(key).and_then(|s| s.trim().parse::<u16>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
