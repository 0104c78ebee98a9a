//! SpamGuard - keyword based SMS spam filter
//!
//! Keeps a user-edited list of spam keywords and suppresses incoming text
//! messages whose body contains any of them.
//!
//! ## Architecture
//!
//! - `spamguard-core`: keyword store, classifier, message receiver, config
//! - `spamguard-sms-bridge`: ADB backed inbox watcher and suppression
//! - `commands`: the CLI on top of both

#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use spamguard_core as core;
pub use spamguard_sms_bridge as bridge;

/// Prelude module for convenient imports
pub mod prelude {
    pub use spamguard_core::{
        classify, AppConfig, FilePreferences, IncomingMessage, KeywordListView, KeywordSet,
        KeywordStore, MessageReceiver, PreferenceStore, Verdict,
    };
    pub use spamguard_sms_bridge::{AdbClient, InboxWatcher};
}
