use std::path::PathBuf;

use serde::Deserialize;

use crate::types::Error;

#[derive(Deserialize, Debug)]
pub(crate) struct BotConfig {
    pub(crate) token: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct DatabaseConfig {
    pub(crate) url: String,
}

/// Destination channels for announcement routing, see
/// `ChannelRoutes::for_announcement`.
#[derive(Deserialize, Debug)]
pub(crate) struct ChannelConfig {
    pub(crate) announcement: u64,
    pub(crate) test_announcement: u64,
    pub(crate) schedule: u64,
    pub(crate) activity_check: u64,
}

pub(crate) struct Config {
    pub(crate) bot: BotConfig,
    pub(crate) db: DatabaseConfig,
    pub(crate) channels: ChannelConfig,
}

pub(crate) fn load_config() -> Result<Config, Error> {
    let bot: BotConfig = serde_envfile::prefixed("PACKHERALD_").from_file(&PathBuf::from(".env"))?;
    let db: DatabaseConfig =
        serde_envfile::prefixed("DATABASE_").from_file(&PathBuf::from(".env"))?;
    let channels: ChannelConfig =
        serde_envfile::prefixed("CHANNEL_").from_file(&PathBuf::from(".env"))?;

    Ok(Config { bot, db, channels })
}
