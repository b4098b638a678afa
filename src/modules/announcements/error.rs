use thiserror::Error;

use crate::time::TimeParseError;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ScheduleError {
    #[error(transparent)]
    Parse(#[from] TimeParseError),
    #[error("the time you provided, <t:{0}:F>, is in the past")]
    PastTime(i64),
    #[error("there is already an announcement scheduled for <t:{0}:F>")]
    SlotTaken(i64),
    #[error("the announcement {0} does not exist")]
    UnknownAnnouncement(String),
    #[error("no announcement found at <t:{0}:F>")]
    NotFound(i64),
}
