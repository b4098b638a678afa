use std::time::Duration;

use crate::types::Context;

/// Discord renders `<t:ts:F>` as a full date-time in the reader's own timezone.
pub(crate) fn discord_timestamp(ts: i64) -> String {
    format!("<t:{}:F>", ts)
}

/// Wait for a follow-up message from the same user in the same channel.
/// Returns the trimmed content, or `None` on timeout.
pub(crate) async fn await_reply(ctx: &Context<'_>, timeout: Duration) -> Option<String> {
    ctx.channel_id()
        .await_reply(ctx.serenity_context())
        .author_id(ctx.author().id)
        .timeout(timeout)
        .await
        .map(|msg| msg.content.trim().to_owned())
}
