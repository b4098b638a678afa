use std::sync::Arc;

use poise::serenity_prelude::{self as serenity};

use crate::spawn_task;
use crate::types::{Data, Error};

pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod scheduler;
pub(crate) mod store;
pub(crate) mod tasks;
pub(crate) mod templates;

pub(crate) fn commands() -> Vec<poise::Command<Arc<Data>, Error>> {
    vec![
        commands::delay(),
        commands::canceldelay(),
        commands::viewdelay(),
    ]
}

pub(crate) fn start_tasks(ctx: serenity::Context, data: Arc<Data>) {
    // the tick must only ever run once per process
    if !data.scheduler.claim_ticker() {
        return;
    }

    spawn_task!(60, tasks::check_delays, ctx, data);
}
