use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use poise::serenity_prelude::{self as serenity};
use tracing::{error, info};

use crate::modules::announcements::store::Job;
use crate::modules::announcements::templates;
use crate::modules::cycle;
use crate::types::{Data, Error};
use crate::util::discord_timestamp;

/// One tick of the announcement loop: send pre-fire warnings, then drain and
/// deliver everything that is due. Runs once a minute.
pub(crate) async fn check_delays(ctx: &serenity::Context, data: Arc<Data>) -> Result<(), Error> {
    let now = Utc::now();

    for warning in data.scheduler.take_due_warnings(now).await {
        let notice = format!(
            "**5 Minute Warning:** The announcement **{}** scheduled for {} from <@{}> \
             will be announced in 5 minutes. You can still cancel it with `/canceldelay`.",
            warning.name,
            discord_timestamp(warning.fire_at),
            warning.author,
        );
        if let Err(err) = serenity::ChannelId::new(warning.input_channel)
            .say(&ctx.http, notice)
            .await
        {
            error!(
                channel_id = warning.input_channel,
                "couldn't send warning: {}", err
            );
        }
    }

    // buckets are fully drained (and the removal persisted) before anything
    // is sent, so the pending count below matches what list_pending would see
    let drained = data.scheduler.drain_due(now).await;
    if drained.fired.is_empty() {
        return Ok(());
    }

    let mut confirm_channels = BTreeSet::new();
    for (fire_at, job) in &drained.fired {
        confirm_channels.insert(job.input_channel);

        // a bad job is logged and counts as fired, the tick carries on
        if let Err(err) = deliver(ctx, &data, job).await {
            error!(name = %job.name, fire_at, "couldn't deliver announcement: {}", err);
        } else {
            info!(name = %job.name, fire_at, "announcement delivered");
        }
    }

    for channel_id in confirm_channels {
        let confirmation = format!(
            "Announcement confirmed. There are {} announcement(s) pending.",
            drained.pending
        );
        if let Err(err) = serenity::ChannelId::new(channel_id)
            .say(&ctx.http, confirmation)
            .await
        {
            error!(channel_id, "couldn't send confirmation: {}", err);
        }
    }

    Ok(())
}

async fn deliver(ctx: &serenity::Context, data: &Data, job: &Job) -> Result<(), Error> {
    let channel = serenity::ChannelId::new(job.announce_channel);

    let text = match data.templates.get(&job.name) {
        Some(template) => match &job.substitutions {
            Some(subs) => match templates::render(template, subs) {
                Ok(text) => text,
                Err(err) => {
                    // the job is already out of the queue, skip delivery only
                    error!(name = %job.name, "{}", err);
                    return Ok(());
                }
            },
            None => template.to_owned(),
        },
        None => format!("Announcement {} is now due.", job.name),
    };

    channel.say(&ctx.http, text).await?;

    // a fired schedule announcement is followed by the current cycle embed
    if job.name == "schedule" {
        if let Some(times) = cycle::db::get_schedule(&data.db).await? {
            channel
                .send_message(
                    &ctx.http,
                    serenity::CreateMessage::new().embed(cycle::schedule_embed(&times)),
                )
                .await?;
        }
    }

    Ok(())
}
