use std::sync::Arc;

use poise::serenity_prelude::{self as serenity};
use tracing::info;

use crate::types::{Data, Error};

pub(crate) async fn handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Arc<Data>, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                user_id = data_about_bot.user.id.get(),
                "connected to discord as '{}'", data_about_bot.user.name,
            );
            info!(
                "{} announcement(s) pending delivery",
                data.scheduler.pending_count().await
            );
        }
        _ => {}
    }
    Ok(())
}
