use std::time::Duration;

use chrono::Utc;

use super::db;
use crate::modules::timezones;
use crate::types::{Context, Error};
use crate::util::await_reply;

const CONFIRM_TIMEOUT: Duration = Duration::from_secs(15);
const TIME_TIMEOUT: Duration = Duration::from_secs(60);

/// Reset the cycle schedule from a pack-expiry time, deriving the other
/// phase boundaries.
#[poise::command(slash_command, guild_only = true, rename = "resetschedule")]
pub(crate) async fn resetschedule(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(
        "⚠️ **Are you sure you want to reset the schedule?**\n(Type `y` to confirm, `n` to cancel.)",
    )
    .await?;

    let Some(confirmation) = await_reply(&ctx, CONFIRM_TIMEOUT).await else {
        ctx.say("⏳ No response received. Schedule reset canceled.")
            .await?;
        return Ok(());
    };
    if !confirmation.eq_ignore_ascii_case("y") {
        ctx.say("❌ Schedule reset canceled.").await?;
        return Ok(());
    }

    ctx.say(
        "Please enter the pack expiration time in **MM/DD HH:MM** format.\nType `exit` to cancel.",
    )
    .await?;

    let tz = crate::time::resolve_timezone(
        timezones::db::get_timezone(&ctx.data().db, ctx.author().id.get())
            .await?
            .as_deref(),
    );

    loop {
        let Some(reply) = await_reply(&ctx, TIME_TIMEOUT).await else {
            ctx.say("⏳ You took too long to respond. Schedule reset canceled.")
                .await?;
            return Ok(());
        };
        if reply.eq_ignore_ascii_case("exit") {
            ctx.say("❌ Schedule reset canceled.").await?;
            return Ok(());
        }

        match crate::time::resolve_instant(tz, &reply, Utc::now()) {
            Ok(expiry) => {
                let times = db::CycleTimes::from_pack_expiry(expiry);
                db::replace_schedule(&ctx.data().db, &times).await?;

                let embed = super::schedule_embed(&times)
                    .title("✅ **Schedule successfully updated!**");
                ctx.send(poise::CreateReply::default().embed(embed)).await?;
                return Ok(());
            }
            Err(_) => {
                ctx.say(
                    "⚠️ Invalid format! Please enter the time in MM/DD HH:MM format \
                     (e.g., 03/15 18:00). Type `exit` to cancel.",
                )
                .await?;
            }
        }
    }
}

/// Show the stored cycle schedule without changing it.
#[poise::command(slash_command, guild_only = true, rename = "currentschedule")]
pub(crate) async fn currentschedule(ctx: Context<'_>) -> Result<(), Error> {
    match db::get_schedule(&ctx.data().db).await? {
        Some(times) => {
            ctx.send(poise::CreateReply::default().embed(super::schedule_embed(&times)))
                .await?;
        }
        None => {
            ctx.say("No schedule is set. Use `/resetschedule` to create one.")
                .await?;
        }
    }

    Ok(())
}
