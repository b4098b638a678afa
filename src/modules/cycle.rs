use std::sync::Arc;

use poise::serenity_prelude::{self as serenity};

use crate::types::{Data, Error};
use crate::util::discord_timestamp;

pub(crate) mod commands;
pub(crate) mod db;

pub(crate) fn commands() -> Vec<poise::Command<Arc<Data>, Error>> {
    vec![commands::resetschedule(), commands::currentschedule()]
}

/// The embed shown by `/currentschedule` and after fired schedule
/// announcements.
pub(crate) fn schedule_embed(times: &db::CycleTimes) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("✅ **The current schedule is as follows:**")
        .colour(serenity::Colour(0x39FF14))
        .description(format!(
            "──────────────────────────────\n\
             🔹 Voting will begin at:\n**{}**\n\n\
             🔹 Picking will begin at:\n**{}**\n\n\
             🔹 Owner WP will begin at:\n**{}**\n\n\
             🔹 Pack will die at:\n**{}**",
            discord_timestamp(times.voting_start.timestamp()),
            discord_timestamp(times.picking_start.timestamp()),
            discord_timestamp(times.owner_wp_start.timestamp()),
            discord_timestamp(times.pack_expiry.timestamp()),
        ))
}
