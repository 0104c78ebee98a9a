//! Inbox Watcher
//!
//! Polls the device inbox and forwards every newly arrived message. The
//! first poll only records the highest message id seen; messages that were
//! already in the inbox when watching started are never forwarded.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adb::{AdbClient, AdbError};
use crate::inbox::SmsRecord;

/// Polling message source for one device
pub struct InboxWatcher {
    client: AdbClient,
    serial: String,
    interval: Duration,
    /// Highest id already handled, `None` until the baseline is taken
    high_water: Option<u64>,
}

impl InboxWatcher {
    pub fn new(client: AdbClient, serial: impl Into<String>, interval: Duration) -> Self {
        Self {
            client,
            serial: serial.into(),
            interval,
            high_water: None,
        }
    }

    pub fn high_water(&self) -> Option<u64> {
        self.high_water
    }

    /// Fetch messages that arrived since the previous poll.
    ///
    /// The first call takes the baseline and returns nothing.
    pub async fn poll(&mut self) -> Result<Vec<SmsRecord>, AdbError> {
        let records = self.client.query_inbox(&self.serial, self.high_water).await?;
        Ok(self.advance(records))
    }

    /// Keep the records above the high-water mark and raise the mark
    fn advance(&mut self, records: Vec<SmsRecord>) -> Vec<SmsRecord> {
        let newest = records.iter().map(|r| r.id).max();

        let Some(mark) = self.high_water else {
            let baseline = newest.unwrap_or(0);
            info!("Inbox baseline for {} at id {}", self.serial, baseline);
            self.high_water = Some(baseline);
            return Vec::new();
        };

        let mut fresh: Vec<SmsRecord> = records.into_iter().filter(|r| r.id > mark).collect();
        fresh.sort_by_key(|r| r.id);

        if let Some(last) = fresh.last() {
            self.high_water = Some(last.id);
            debug!("{} new messages, high water now {}", fresh.len(), last.id);
        }
        fresh
    }

    /// Poll on the configured interval and send new messages to `tx`
    /// until the receiving side is dropped.
    pub fn spawn(mut self, tx: mpsc::Sender<SmsRecord>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }

                let records = match self.poll().await {
                    Ok(records) => records,
                    Err(e) => {
                        warn!("Inbox poll on {} failed: {}", self.serial, e);
                        continue;
                    }
                };

                for record in records {
                    if tx.send(record).await.is_err() {
                        debug!("Message channel closed, stopping watcher");
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn record(id: u64, body: &str) -> SmsRecord {
        SmsRecord {
            id,
            address: Some("+1".into()),
            body: Some(body.into()),
        }
    }

    fn watcher() -> InboxWatcher {
        InboxWatcher::new(
            AdbClient::new(Path::new("/nonexistent/sdk")),
            "emulator-5554",
            Duration::from_millis(100),
        )
    }

    #[test]
    fn test_first_poll_sets_baseline() {
        let mut w = watcher();
        let fresh = w.advance(vec![record(3, "old"), record(9, "older")]);
        assert!(fresh.is_empty());
        assert_eq!(w.high_water(), Some(9));
    }

    #[test]
    fn test_empty_inbox_baseline() {
        let mut w = watcher();
        assert!(w.advance(Vec::new()).is_empty());
        assert_eq!(w.high_water(), Some(0));

        let fresh = w.advance(vec![record(1, "first")]);
        assert_eq!(fresh, vec![record(1, "first")]);
    }

    #[test]
    fn test_only_new_messages_in_order() {
        let mut w = watcher();
        w.advance(vec![record(5, "seen")]);

        let fresh = w.advance(vec![record(8, "b"), record(5, "seen"), record(6, "a")]);
        assert_eq!(fresh, vec![record(6, "a"), record(8, "b")]);
        assert_eq!(w.high_water(), Some(8));

        assert!(w.advance(vec![record(8, "b")]).is_empty());
        assert_eq!(w.high_water(), Some(8));
    }

    #[test]
    fn test_poll_error_leaves_state() {
        let mut w = watcher();
        let result = tokio_test::block_on(w.poll());
        assert!(matches!(result, Err(AdbError::NotFound)));
        assert_eq!(w.high_water(), None);
    }
}
