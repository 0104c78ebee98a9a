//! SpamGuard Core - Keyword store, classifier and message receiver
//!
//! This crate holds everything the filter needs that is independent of how
//! messages reach the host: the persisted keyword list, the spam predicate
//! and the inbound message handler that turns a message into a verdict.

pub mod classifier;
pub mod config;
pub mod error;
pub mod events;
pub mod keywords;
pub mod message;
pub mod prefs;
pub mod receiver;
pub mod view;

pub use classifier::{classify, first_match};
pub use config::AppConfig;
pub use error::{SpamGuardError, Result};
pub use events::{Event, EventBus};
pub use keywords::{AddOutcome, KeywordSet, KeywordStore, KEYWORDS_KEY, PREFS_NAMESPACE};
pub use message::IncomingMessage;
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore};
pub use receiver::{MessageReceiver, Verdict};
pub use view::KeywordListView;

/// SpamGuard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "SpamGuard";
