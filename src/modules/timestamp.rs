use std::sync::Arc;

use chrono::Utc;

use crate::modules::timezones;
use crate::types::{Context, Data, Error};
use crate::util::discord_timestamp;

/// Convert a time in the caller's timezone into a Discord timestamp code.
#[poise::command(slash_command, rename = "timestamp")]
pub(crate) async fn timestamp(
    ctx: Context<'_>,
    #[description = "Time to convert, MM/DD HH:MM in your timezone"] time: String,
) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let tz = crate::time::resolve_timezone(
        timezones::db::get_timezone(&ctx.data().db, ctx.author().id.get())
            .await?
            .as_deref(),
    );

    match crate::time::resolve_instant(tz, &time, Utc::now()) {
        Ok(instant) => {
            let ts = instant.timestamp();
            ctx.reply(format!(
                "Here is your Discord timestamp display:\n**{}**\nRaw timestamp: `{}`",
                discord_timestamp(ts),
                ts
            ))
            .await?;
        }
        Err(_) => {
            ctx.reply("⚠️ **Invalid format!** Please use **MM/DD HH:MM** (e.g. `03/15 18:00`).")
                .await?;
        }
    }

    Ok(())
}

pub(crate) fn commands() -> Vec<poise::Command<Arc<Data>, Error>> {
    vec![timestamp()]
}
