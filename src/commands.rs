//! CLI commands for SpamGuard
//!
//! Keyword list management, one-off classification and the device watcher.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use spamguard_core::config::SuppressMode;
use spamguard_core::events::EventSubscription;
use spamguard_core::{
    AddOutcome, AppConfig, Event, EventBus, FilePreferences, IncomingMessage, KeywordListView,
    KeywordStore, MessageReceiver, SpamGuardError, Verdict,
};
use spamguard_sms_bridge::{AdbClient, InboxWatcher, SmsRecord};

/// Resolved settings shared by all commands
pub struct Context {
    pub config: AppConfig,
    pub data_dir: PathBuf,
}

impl Context {
    pub fn new(config: AppConfig, data_dir_override: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir_override {
            Some(dir) => dir,
            None => config.data_dir()?,
        };
        Ok(Self { config, data_dir })
    }

    /// Preferences backend in the data directory
    pub fn prefs(&self) -> FilePreferences {
        FilePreferences::new(&self.data_dir)
    }

    pub fn store(&self) -> KeywordStore<FilePreferences> {
        KeywordStore::new(self.prefs())
    }

    fn adb(&self) -> AdbClient {
        AdbClient::detect(self.config.bridge.sdk_path.as_deref())
    }
}

/// Print the user-facing text of a recoverable error, propagate the rest
fn report(err: SpamGuardError) -> Result<()> {
    if err.is_recoverable() {
        println!("{}", err.user_message());
        Ok(())
    } else {
        Err(err.into())
    }
}

/// Keyword list command
pub struct ListCommand;

impl ListCommand {
    pub fn execute(&self, ctx: &Context) -> Result<()> {
        let view = KeywordListView::new(ctx.store());

        if view.is_empty() {
            println!("No keywords configured");
        } else {
            println!("Spam keywords:");
            for (index, keyword) in view.items().iter().enumerate() {
                println!("  [{}] {}", index, keyword);
            }
        }

        Ok(())
    }
}

/// Add keyword command
pub struct AddCommand {
    pub keyword: String,
}

impl AddCommand {
    pub fn execute(&self, ctx: &Context) -> Result<()> {
        let mut view = KeywordListView::new(ctx.store());

        match view.add(&self.keyword) {
            Ok(AddOutcome::Added(keyword)) => println!("Added keyword: {}", keyword),
            Ok(AddOutcome::AlreadyPresent(keyword)) => println!("Already in list: {}", keyword),
            Err(e) => return report(e),
        }

        Ok(())
    }
}

/// Positional remove command
pub struct RemoveCommand {
    pub index: usize,
}

impl RemoveCommand {
    pub fn execute(&self, ctx: &Context) -> Result<()> {
        let mut view = KeywordListView::new(ctx.store());

        match view.remove(self.index) {
            Ok(keyword) => println!("Removed keyword: {}", keyword),
            Err(e) => return report(e),
        }

        Ok(())
    }
}

/// Value-based remove command
pub struct RemoveKeywordCommand {
    pub keyword: String,
}

impl RemoveKeywordCommand {
    pub fn execute(&self, ctx: &Context) -> Result<()> {
        if ctx.store().remove(&self.keyword)? {
            println!("Removed keyword: {}", self.keyword.trim());
            Ok(())
        } else {
            report(SpamGuardError::NotFound(self.keyword.trim().to_string()))
        }
    }
}

/// Clear command
pub struct ClearCommand;

impl ClearCommand {
    pub fn execute(&self, ctx: &Context) -> Result<()> {
        ctx.store().clear()?;
        println!("Keyword list cleared");
        Ok(())
    }
}

/// Classify a single message body
pub struct CheckCommand {
    pub sender: Option<String>,
    pub body: String,
}

impl CheckCommand {
    pub fn execute(&self, ctx: &Context) -> Result<Verdict> {
        let receiver = MessageReceiver::new(ctx.prefs());
        let message = IncomingMessage::new(self.sender.clone(), Some(self.body.clone()));

        let verdict = receiver.on_receive(&message);
        match &verdict {
            Verdict::Suppress { keyword } => println!("SPAM (matched \"{}\")", keyword),
            Verdict::Allow => println!("OK"),
        }

        Ok(verdict)
    }
}

/// Watch a device inbox and suppress spam
pub struct WatchCommand {
    pub serial: Option<String>,
    pub report_only: bool,
}

impl WatchCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let adb = ctx.adb();
        let serial = self
            .serial
            .as_deref()
            .or(ctx.config.bridge.device_serial.as_deref());
        let device = adb
            .select_device(serial)
            .await
            .context("No device to watch")?;

        let mode = if self.report_only {
            SuppressMode::Report
        } else {
            ctx.config.bridge.suppress
        };

        let event_bus = Arc::new(EventBus::new());
        let events = event_bus.subscribe();
        let receiver = MessageReceiver::new(ctx.prefs()).with_event_bus(Arc::clone(&event_bus));

        let (tx, mut rx) = mpsc::channel::<SmsRecord>(64);
        let watcher = InboxWatcher::new(adb.clone(), device.serial.clone(), ctx.config.poll_interval());
        let handle = watcher.spawn(tx);

        info!("Watching {} ({:?} mode)", device.display_name(), mode);
        println!("Watching {} for spam, press Ctrl-C to stop", device.display_name());

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                record = rx.recv() => {
                    let Some(record) = record else {
                        warn!("Inbox watcher stopped");
                        break;
                    };

                    let id = record.id;
                    let message = IncomingMessage::from(record);
                    let verdict = receiver.on_receive(&message);

                    if verdict.is_suppress() && mode == SuppressMode::Delete {
                        if let Err(e) = adb.delete_sms(&device.serial, id).await {
                            warn!("Could not delete message {}: {}", id, e);
                            event_bus.emit(Event::SuppressionFailed {
                                sender: message.sender.clone(),
                                reason: e.to_string(),
                            });
                        }
                    }

                    print_events(&events);
                }
            }
        }

        handle.abort();
        event_bus.emit(Event::Shutdown);
        print_events(&events);
        Ok(())
    }
}

fn print_events(events: &EventSubscription) {
    for event in events.drain() {
        match event {
            Event::MessageSuppressed { sender, keyword } => println!(
                "Spam message blocked from {} (\"{}\")",
                sender.as_deref().unwrap_or("unknown"),
                keyword
            ),
            Event::MessageAllowed { sender } => {
                println!("Message from {} allowed", sender.as_deref().unwrap_or("unknown"))
            }
            Event::SuppressionFailed { sender, reason } => println!(
                "Spam from {} detected but not removed: {}",
                sender.as_deref().unwrap_or("unknown"),
                reason
            ),
            Event::Shutdown => println!("Stopped watching"),
            _ => {}
        }
    }
}

/// Device list command
pub struct DevicesCommand;

impl DevicesCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        let devices = ctx.adb().list_devices().await?;

        if devices.is_empty() {
            println!("No devices connected");
        } else {
            println!("Connected devices:");
            for device in devices {
                println!("  {} - {}", device.display_name(), device.state.as_str());
            }
        }

        Ok(())
    }
}

/// Send a test message to an emulator
pub struct InjectCommand {
    pub serial: String,
    pub from: String,
    pub body: String,
}

impl InjectCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        ctx.adb()
            .emulator_send_sms(&self.serial, &self.from, &self.body)
            .await
            .with_context(|| format!("Sending SMS to {}", self.serial))?;
        println!("Sent message from {} to {}", self.from, self.serial);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(AppConfig::default(), Some(dir.path().to_path_buf())).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_add_list_remove_flow() {
        let (_dir, ctx) = context();

        for keyword in ["a", "b", "c"] {
            AddCommand { keyword: keyword.into() }.execute(&ctx).unwrap();
        }
        ListCommand.execute(&ctx).unwrap();

        RemoveCommand { index: 1 }.execute(&ctx).unwrap();
        assert_eq!(ctx.store().load().to_vec(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_user_errors_are_not_fatal() {
        let (_dir, ctx) = context();

        assert!(AddCommand { keyword: "   ".into() }.execute(&ctx).is_ok());
        assert!(RemoveCommand { index: 9 }.execute(&ctx).is_ok());
        assert!(RemoveKeywordCommand { keyword: "ghost".into() }.execute(&ctx).is_ok());
        assert!(ctx.store().load().is_empty());
    }

    #[test]
    fn test_check_reads_persisted_keywords() {
        let (_dir, ctx) = context();
        AddCommand { keyword: "FREE".into() }.execute(&ctx).unwrap();

        let spam = CheckCommand { sender: None, body: "you have a free gift".into() };
        assert!(spam.execute(&ctx).unwrap().is_suppress());

        let ham = CheckCommand { sender: Some("+1".into()), body: "see you at dinner".into() };
        assert_eq!(ham.execute(&ctx).unwrap(), Verdict::Allow);
    }

    #[test]
    fn test_clear() {
        let (_dir, ctx) = context();
        AddCommand { keyword: "a".into() }.execute(&ctx).unwrap();
        ClearCommand.execute(&ctx).unwrap();
        assert!(ctx.store().load().is_empty());
    }
}
