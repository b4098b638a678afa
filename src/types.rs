use std::sync::Arc;

use crate::modules::announcements::scheduler::Scheduler;
use crate::modules::announcements::templates::TemplateStore;

#[derive(Debug)]
pub(crate) struct Data {
    pub(crate) db: sqlx::PgPool,
    pub(crate) templates: Arc<TemplateStore>,
    pub(crate) scheduler: Scheduler,
}

impl Data {
    pub(crate) fn new(db: sqlx::PgPool, templates: Arc<TemplateStore>, scheduler: Scheduler) -> Self {
        Self {
            db,
            templates,
            scheduler,
        }
    }
}

pub(crate) type Error = Box<dyn std::error::Error + Send + Sync>;
pub(crate) type Context<'a> = poise::Context<'a, Arc<Data>, Error>;
