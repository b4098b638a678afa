use crate::types::Error;

pub(crate) async fn get_timezone(db: &sqlx::PgPool, user_id: u64) -> Result<Option<String>, Error> {
    let timezone: Option<String> =
        sqlx::query_scalar("SELECT timezone FROM timezones WHERE user_id = $1")
            .bind(i64::try_from(user_id)?)
            .fetch_optional(db)
            .await?;

    Ok(timezone)
}

pub(crate) async fn set_timezone(db: &sqlx::PgPool, user_id: u64, timezone: &str) -> Result<(), Error> {
    sqlx::query(
        "INSERT INTO timezones (user_id, timezone) VALUES ($1, $2)
         ON CONFLICT (user_id) DO UPDATE SET timezone = $2",
    )
    .bind(i64::try_from(user_id)?)
    .bind(timezone)
    .execute(db)
    .await?;

    Ok(())
}
