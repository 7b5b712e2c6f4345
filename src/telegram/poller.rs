use crate::relay::Relay;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Backoff after a failed poll round.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-poll `getUpdates` forever, dispatching each update as its own task.
///
/// Transient poll and parse failures are logged and retried; they never stop
/// the loop.
pub async fn run(relay: Arc<Relay>) -> Result<()> {
    let mut offset: i64 = 0;

    tracing::info!("long-polling for updates...");

    loop {
        let updates = match relay.api().get_updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "poll error");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let relay = Arc::clone(&relay);
            tokio::spawn(async move {
                relay.handle_update(update).await;
            });
        }
    }
}
