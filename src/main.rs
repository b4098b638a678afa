use std::{sync::Arc, time::Duration};

use poise::serenity_prelude::{self as serenity};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions,
};
use tracing::{debug, log::LevelFilter};

use crate::modules::announcements::scheduler::{ChannelRoutes, Scheduler};
use crate::modules::announcements::store::JobStore;
use crate::modules::announcements::templates::TemplateStore;
use crate::types::Data;

mod config;
mod events;
mod modules;
mod task;
mod time;
mod types;
mod util;

const DELAY_FILE: &str = "delayed_announcements.json";
const ANNOUNCEMENTS_FILE: &str = "announcements.txt";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = config::load_config().expect("error loading envfile");
    let connect_opts = config
        .db
        .url
        .parse::<PgConnectOptions>()
        .expect("couldn't parse db url")
        .log_statements(LevelFilter::Trace)
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(5));

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(connect_opts)
        .await
        .expect("error connecting to db");

    sqlx::migrate!()
        .run(&db)
        .await
        .expect("error running migrations");

    let templates = Arc::new(TemplateStore::load(ANNOUNCEMENTS_FILE));
    let scheduler = Scheduler::new(
        JobStore::new(DELAY_FILE),
        templates.clone(),
        ChannelRoutes {
            announcement: config.channels.announcement,
            test_announcement: config.channels.test_announcement,
            schedule: config.channels.schedule,
            activity_check: config.channels.activity_check,
        },
    );

    let intents = serenity::GatewayIntents::all();
    let options = poise::FrameworkOptions {
        pre_command: |ctx| {
            Box::pin(async move {
                debug!("executing command /{}...", ctx.invoked_command_name());
            })
        },
        post_command: |ctx| {
            Box::pin(async move {
                debug!("finished executing command /{}", ctx.invoked_command_name());
            })
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(events::handler(ctx, event, framework, data))
        },
        commands: [
            modules::announcements::commands(),
            modules::cycle::commands(),
            modules::timestamp::commands(),
            modules::timezones::commands(),
        ]
        .into_iter()
        .flatten()
        .collect(),
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(options)
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let data = Arc::new(Data::new(db, templates, scheduler));

                modules::announcements::start_tasks(ctx.to_owned(), data.clone());

                Ok(data.clone())
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(config.bot.token, intents)
        .framework(framework)
        .await;

    client.unwrap().start().await.unwrap();
}
