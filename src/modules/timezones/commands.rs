use chrono_tz::Tz;
use poise::serenity_prelude::{self as serenity};
use tracing::debug;

use super::db;
use crate::types::{Context, Error};

/// Store a timezone preference, for yourself or (moderators) another user.
#[poise::command(slash_command, guild_only = true, rename = "settimezone")]
pub(crate) async fn settimezone(
    ctx: Context<'_>,
    #[description = "IANA timezone name, e.g. Europe/Berlin"] timezone: String,
    #[description = "(optional) user to set it for"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let timezone = timezone.trim().to_owned();
    if timezone.parse::<Tz>().is_err() {
        ctx.reply("⚠️ Invalid timezone. Please try again (e.g. `Europe/Berlin`).")
            .await?;
        return Ok(());
    }

    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    debug!(user_id = target.id.get(), timezone = %timezone, "storing timezone");
    db::set_timezone(&ctx.data().db, target.id.get(), &timezone).await?;

    if target.id == ctx.author().id {
        ctx.reply(format!("✅ Your timezone has been set to **{}**.", timezone))
            .await?;
    } else {
        ctx.reply(format!(
            "✅ Timezone for {} has been set to **{}**.",
            target.name, timezone
        ))
        .await?;
    }

    Ok(())
}

/// Show the current time in the caller's stored timezone.
#[poise::command(slash_command, rename = "time")]
pub(crate) async fn time(ctx: Context<'_>) -> Result<(), Error> {
    match db::get_timezone(&ctx.data().db, ctx.author().id.get()).await? {
        Some(tz_name) => {
            let tz = crate::time::resolve_timezone(Some(&tz_name));
            let now = chrono::Utc::now().with_timezone(&tz);
            ctx.reply(format!(
                "The current time in your timezone ({}) is: {}",
                tz_name,
                now.format("%Y-%m-%d %H:%M:%S")
            ))
            .await?;
        }
        None => {
            ctx.reply("⚠️ You have not set a timezone yet. Use `/settimezone` to set it.")
                .await?;
        }
    }

    Ok(())
}
