use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use poise::serenity_prelude::{self as serenity};

use crate::modules::announcements::error::ScheduleError;
use crate::modules::announcements::scheduler::ScheduleRequest;
use crate::modules::timezones;
use crate::types::{Context, Error};
use crate::util::{await_reply, discord_timestamp};

const REPROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// `KEY=value, KEY=value` pairs for template placeholders.
fn parse_substitutions(input: &str) -> Option<HashMap<String, String>> {
    let mut subs = HashMap::new();
    for pair in input.split(',') {
        let (key, value) = pair.split_once('=')?;
        subs.insert(key.trim().to_owned(), value.trim().to_owned());
    }
    Some(subs)
}

/// Schedule an announcement for later.
///
/// Recoverable time errors re-prompt in channel until the user gets it right,
/// types `exit`, or times out.
#[poise::command(slash_command, guild_only = true, rename = "delay")]
pub(crate) async fn delay(
    ctx: Context<'_>,
    #[description = "Name of the announcement template"] name: String,
    #[description = "When to announce, MM/DD HH:MM in your timezone"] time: String,
    #[description = "Optional KEY=value substitutions, comma separated"]
    substitutions: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();

    let substitutions = match substitutions.as_deref() {
        Some(raw) => match parse_substitutions(raw) {
            Some(subs) => Some(subs),
            None => {
                ctx.say("Invalid substitutions, use `KEY=value, KEY=value`.")
                    .await?;
                return Ok(());
            }
        },
        None => None,
    };

    let tz = crate::time::resolve_timezone(
        timezones::db::get_timezone(&data.db, ctx.author().id.get())
            .await?
            .as_deref(),
    );

    let mut time_str = time;
    loop {
        if time_str.eq_ignore_ascii_case("exit") {
            ctx.say("Announcement scheduling canceled.").await?;
            return Ok(());
        }

        let now = Utc::now();
        let result = match crate::time::resolve_instant(tz, &time_str, now) {
            Ok(fire_at) => {
                data.scheduler
                    .schedule(
                        ScheduleRequest {
                            name: name.clone(),
                            fire_at,
                            author: ctx.author().id.get(),
                            input_channel: ctx.channel_id().get(),
                            substitutions: substitutions.clone(),
                        },
                        now,
                    )
                    .await
            }
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(scheduled) => {
                ctx.say(format!(
                    "Scheduled announcement: **{}** for {}.\nThere are now **{} announcement(s)** pending.",
                    name,
                    discord_timestamp(scheduled.fire_at),
                    scheduled.pending,
                ))
                .await?;
                return Ok(());
            }
            Err(err @ ScheduleError::UnknownAnnouncement(_)) => {
                ctx.say(format!("Error: {}.", err)).await?;
                return Ok(());
            }
            Err(err) => {
                ctx.say(format!(
                    "{}\nPlease provide a new time in MM/DD HH:MM format or type `exit` to cancel.",
                    reprompt_message(&err),
                ))
                .await?;

                match await_reply(&ctx, REPROMPT_TIMEOUT).await {
                    Some(reply) => time_str = reply,
                    None => {
                        ctx.say("You took too long to respond. Announcement scheduling canceled.")
                            .await?;
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn reprompt_message(err: &ScheduleError) -> String {
    match err {
        ScheduleError::Parse(_) => "Invalid time format! Use MM/DD HH:MM.".into(),
        err => format!("Error: {}.", err),
    }
}

/// Cancel every announcement scheduled at the given time.
#[poise::command(slash_command, guild_only = true, rename = "canceldelay")]
pub(crate) async fn canceldelay(
    ctx: Context<'_>,
    #[description = "Scheduled time to cancel, MM/DD HH:MM in your timezone"] time: String,
) -> Result<(), Error> {
    let data = ctx.data();

    let tz = crate::time::resolve_timezone(
        timezones::db::get_timezone(&data.db, ctx.author().id.get())
            .await?
            .as_deref(),
    );
    let fire_at = match crate::time::resolve_instant(tz, &time, Utc::now()) {
        Ok(fire_at) => fire_at,
        Err(_) => {
            ctx.say("Invalid time format! Use MM/DD HH:MM.").await?;
            return Ok(());
        }
    };

    match data.scheduler.cancel(fire_at).await {
        Ok(cancelled) => {
            let names = cancelled
                .jobs
                .iter()
                .map(|job| format!("**{}**", job.name))
                .collect::<Vec<_>>()
                .join(", ");
            ctx.say(format!(
                "Cancelled {} originally set for {}.",
                names,
                discord_timestamp(cancelled.fire_at),
            ))
            .await?;
        }
        Err(ScheduleError::NotFound(_)) => {
            ctx.say("No announcement found at that time.").await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

/// Show all pending announcements, earliest first.
#[poise::command(slash_command, guild_only = true, rename = "viewdelay")]
pub(crate) async fn viewdelay(ctx: Context<'_>) -> Result<(), Error> {
    let pending = ctx.data().scheduler.list_pending().await;
    if pending.is_empty() {
        ctx.say("No pending announcements.").await?;
        return Ok(());
    }

    let mut lines = vec!["──────────────────────────────".to_owned()];
    for (fire_at, jobs) in pending {
        for job in jobs {
            lines.push(format!(
                "🔸 **{}**\n   - {}",
                job.name,
                discord_timestamp(fire_at)
            ));
        }
    }

    let embed = serenity::CreateEmbed::new()
        .title("Pending Announcements  📋")
        .colour(serenity::Colour(0xFF8C00))
        .description(lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_substitution_pairs() {
        let subs = parse_substitutions("USER1=alice, PACK1 = Pikachu ex").unwrap();
        assert_eq!(subs.get("USER1").unwrap(), "alice");
        assert_eq!(subs.get("PACK1").unwrap(), "Pikachu ex");
    }

    #[test]
    fn rejects_pairs_without_separator() {
        assert!(parse_substitutions("USER1=alice, PACK1").is_none());
        assert!(parse_substitutions("just words").is_none());
    }
}
