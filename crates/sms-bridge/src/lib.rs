//! SpamGuard SMS Bridge
//!
//! Connects the filter to an Android device over ADB: new inbox messages
//! become [`spamguard_core::IncomingMessage`]s, and messages the receiver
//! suppresses are deleted from the device.

pub mod adb;
pub mod device;
pub mod inbox;
pub mod watcher;

pub use adb::{AdbClient, AdbError};
pub use device::{Device, DeviceState, DeviceType};
pub use inbox::SmsRecord;
pub use watcher::InboxWatcher;
