#[macro_export]
macro_rules! spawn_task {
    ( $interval:expr, $task:expr, $ctx:ident, $data:ident ) => {{
        use tokio::time::MissedTickBehavior;
        use tracing::{debug, error};

        let data = $data.to_owned();
        let ctx = $ctx.to_owned();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs($interval));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                debug!("executing {}", stringify!($task));
                if let Err(err) = $task(&ctx, data.clone()).await {
                    error!("error executing {}: {}", stringify!($task), err)
                }
            }
        });
    }};
}
