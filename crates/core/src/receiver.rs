//! Message Receiver
//!
//! Inbound handler the host calls for every delivered message. It reads the
//! keyword list fresh from storage, classifies the body and answers with a
//! [`Verdict`]; carrying the verdict out (dropping the message, deleting it
//! from an inbox) is left to the host.

use std::sync::Arc;

use tracing::{debug, info};

use crate::classifier::first_match;
use crate::events::{Event, EventBus};
use crate::keywords::KeywordStore;
use crate::message::IncomingMessage;
use crate::prefs::PreferenceStore;

/// Decision for one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Deliver normally
    Allow,
    /// Keep the message from normal delivery
    Suppress {
        /// Keyword that matched the body
        keyword: String,
    },
}

impl Verdict {
    pub fn is_suppress(&self) -> bool {
        matches!(self, Verdict::Suppress { .. })
    }
}

/// Classifies incoming messages against the persisted keyword list
pub struct MessageReceiver<P> {
    store: KeywordStore<P>,
    event_bus: Option<Arc<EventBus>>,
}

impl<P: PreferenceStore> MessageReceiver<P> {
    pub fn new(prefs: P) -> Self {
        Self {
            store: KeywordStore::new(prefs),
            event_bus: None,
        }
    }

    /// Publish verdicts on `event_bus`
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Classify one message
    pub fn on_receive(&self, message: &IncomingMessage) -> Verdict {
        self.emit(Event::MessageReceived {
            sender: message.sender.clone(),
        });

        let keywords = self.store.load();
        match first_match(&keywords, message.body()) {
            Some(keyword) => {
                info!(
                    "Spam message blocked from {} (matched {:?})",
                    message.sender_display(),
                    keyword
                );
                self.emit(Event::MessageSuppressed {
                    sender: message.sender.clone(),
                    keyword: keyword.to_string(),
                });
                Verdict::Suppress {
                    keyword: keyword.to_string(),
                }
            }
            None => {
                debug!(
                    "Message from {} allowed ({} keywords checked)",
                    message.sender_display(),
                    keywords.len()
                );
                self.emit(Event::MessageAllowed {
                    sender: message.sender.clone(),
                });
                Verdict::Allow
            }
        }
    }

    /// Classify every part of one delivery.
    ///
    /// The delivery is suppressed as a whole when any part is spam; the
    /// verdict carries the keyword of the first spam part.
    pub fn on_receive_batch(&self, messages: &[IncomingMessage]) -> Verdict {
        messages
            .iter()
            .map(|message| self.on_receive(message))
            .fold(Verdict::Allow, |verdict, next| match verdict {
                Verdict::Allow => next,
                suppress => suppress,
            })
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::{FilePreferences, MemoryPreferences};

    fn receiver_with(keywords: &[&str]) -> MessageReceiver<Arc<MemoryPreferences>> {
        let prefs = Arc::new(MemoryPreferences::new());
        let store = KeywordStore::new(Arc::clone(&prefs));
        for k in keywords {
            store.add(k).unwrap();
        }
        MessageReceiver::new(prefs)
    }

    fn message(sender: &str, body: &str) -> IncomingMessage {
        IncomingMessage::new(Some(sender.to_string()), Some(body.to_string()))
    }

    #[test]
    fn test_suppresses_spam() {
        let receiver = receiver_with(&["FREE"]);
        let verdict = receiver.on_receive(&message("+100", "you have a free gift"));
        assert_eq!(verdict, Verdict::Suppress { keyword: "FREE".into() });
    }

    #[test]
    fn test_allows_ham() {
        let receiver = receiver_with(&["lottery"]);
        assert_eq!(receiver.on_receive(&message("+100", "see you at dinner")), Verdict::Allow);
    }

    #[test]
    fn test_allows_absent_body() {
        let receiver = receiver_with(&["free"]);
        let msg = IncomingMessage::new(Some("+100".into()), None);
        assert_eq!(receiver.on_receive(&msg), Verdict::Allow);
    }

    #[test]
    fn test_empty_store_allows_everything() {
        let receiver = receiver_with(&[]);
        assert_eq!(receiver.on_receive(&message("+100", "FREE lottery prize")), Verdict::Allow);
    }

    #[test]
    fn test_unreadable_storage_allows() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = FilePreferences::new(dir.path());
        std::fs::write(prefs.namespace_path(crate::PREFS_NAMESPACE).unwrap(), "{ broken").unwrap();

        let receiver = MessageReceiver::new(prefs);
        assert_eq!(receiver.on_receive(&message("+100", "FREE lottery prize")), Verdict::Allow);
    }

    #[test]
    fn test_sees_keywords_added_after_creation() {
        let dir = tempfile::tempdir().unwrap();
        let receiver = MessageReceiver::new(FilePreferences::new(dir.path()));
        let ui_store = KeywordStore::new(FilePreferences::new(dir.path()));

        let msg = message("+100", "Winter offer");
        assert_eq!(receiver.on_receive(&msg), Verdict::Allow);

        ui_store.add("win").unwrap();
        assert!(receiver.on_receive(&msg).is_suppress());

        ui_store.remove("win").unwrap();
        assert_eq!(receiver.on_receive(&msg), Verdict::Allow);
    }

    #[test]
    fn test_batch_suppressed_when_any_part_is_spam() {
        let receiver = receiver_with(&["prize"]);
        let parts = vec![
            message("+100", "Hello there, "),
            message("+100", "claim your PRIZE"),
            message("+100", "today"),
        ];
        assert_eq!(receiver.on_receive_batch(&parts), Verdict::Suppress { keyword: "prize".into() });
        assert_eq!(receiver.on_receive_batch(&parts[..1]), Verdict::Allow);
        assert_eq!(receiver.on_receive_batch(&[]), Verdict::Allow);
    }

    #[test]
    fn test_verdicts_are_published() {
        let bus = Arc::new(EventBus::new());
        let sub = bus.subscribe();
        let receiver = receiver_with(&["free"]).with_event_bus(Arc::clone(&bus));

        receiver.on_receive(&message("+100", "free"));
        receiver.on_receive(&message("+200", "hi"));

        assert_eq!(
            sub.drain(),
            vec![
                Event::MessageReceived { sender: Some("+100".into()) },
                Event::MessageSuppressed { sender: Some("+100".into()), keyword: "free".into() },
                Event::MessageReceived { sender: Some("+200".into()) },
                Event::MessageAllowed { sender: Some("+200".into()) },
            ]
        );
    }
}
