//! Device Types and State
//!
//! Android devices reachable over ADB.

use serde::{Deserialize, Serialize};

/// Device state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    /// Device is online and ready
    Online,
    /// Device is offline
    Offline,
    /// Device is not authorized (need to accept on device)
    Unauthorized,
    /// Unknown state
    Unknown,
}

impl DeviceState {
    /// Parse the state column of `adb devices`
    pub fn parse(value: &str) -> Self {
        match value {
            "device" => DeviceState::Online,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            _ => DeviceState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceState::Online => "device",
            DeviceState::Offline => "offline",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Unknown => "unknown",
        }
    }
}

/// Device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    /// Physical device connected via USB/WiFi
    Physical,
    /// Android emulator
    Emulator,
}

/// Device information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Device serial number
    pub serial: String,
    pub state: DeviceState,
    pub device_type: DeviceType,
    /// Device model (e.g., "Pixel_6")
    pub model: Option<String>,
}

impl Device {
    /// Check if device is online and usable
    pub fn is_usable(&self) -> bool {
        self.state == DeviceState::Online
    }

    /// Emulators accept `adb emu sms send`
    pub fn is_emulator(&self) -> bool {
        self.device_type == DeviceType::Emulator
    }

    /// Get display name
    pub fn display_name(&self) -> String {
        match &self.model {
            Some(model) => format!("{} ({})", model.replace('_', " "), self.serial),
            None => self.serial.clone(),
        }
    }
}

/// Parse the output of `adb devices -l`
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .skip_while(|line| !line.starts_with("List of devices"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?.to_string();
            let state = DeviceState::parse(parts.next()?);
            let model = parts
                .find_map(|part| part.strip_prefix("model:"))
                .map(str::to_string);

            let device_type = if serial.starts_with("emulator-") {
                DeviceType::Emulator
            } else {
                DeviceType::Physical
            };

            Some(Device {
                serial,
                state,
                device_type,
                model,
            })
        })
        .collect()
}
