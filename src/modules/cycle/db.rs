use chrono::{DateTime, Duration, Utc};

use crate::types::Error;

/// The four phase boundaries of the current cycle, ascending.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CycleTimes {
    pub(crate) voting_start: DateTime<Utc>,
    pub(crate) picking_start: DateTime<Utc>,
    pub(crate) owner_wp_start: DateTime<Utc>,
    pub(crate) pack_expiry: DateTime<Utc>,
}

impl CycleTimes {
    /// Work backwards from pack expiry: owner wonder-picks open 16 hours
    /// before expiry, picking 32 hours before that, voting 8 hours before
    /// that.
    pub(crate) fn from_pack_expiry(pack_expiry: DateTime<Utc>) -> Self {
        let owner_wp_start = pack_expiry - Duration::hours(16);
        let picking_start = owner_wp_start - Duration::hours(32);
        let voting_start = picking_start - Duration::hours(8);

        Self {
            voting_start,
            picking_start,
            owner_wp_start,
            pack_expiry,
        }
    }
}

pub(crate) async fn get_schedule(db: &sqlx::PgPool) -> Result<Option<CycleTimes>, Error> {
    let row: Option<(DateTime<Utc>, DateTime<Utc>, DateTime<Utc>, DateTime<Utc>)> =
        sqlx::query_as(
            "SELECT voting_start, picking_start, owner_wp_start, pack_expiry FROM cycle_schedule",
        )
        .fetch_optional(db)
        .await?;

    Ok(row.map(
        |(voting_start, picking_start, owner_wp_start, pack_expiry)| CycleTimes {
            voting_start,
            picking_start,
            owner_wp_start,
            pack_expiry,
        },
    ))
}

/// There is only ever one stored schedule, replacing it swaps the whole row.
pub(crate) async fn replace_schedule(db: &sqlx::PgPool, times: &CycleTimes) -> Result<(), Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM cycle_schedule").execute(&mut *tx).await?;
    sqlx::query(
        "INSERT INTO cycle_schedule (voting_start, picking_start, owner_wp_start, pack_expiry)
         VALUES ($1, $2, $3, $4)",
    )
    .bind(times.voting_start)
    .bind(times.picking_start)
    .bind(times.owner_wp_start)
    .bind(times.pack_expiry)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
