//! ADB (Android Debug Bridge) Client
//!
//! Reads and deletes SMS through the device's content provider and sends
//! test messages to emulators.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::device::{parse_devices, Device};
use crate::inbox::{parse_query_output, SmsRecord};

/// ADB errors
#[derive(Debug, thiserror::Error)]
pub enum AdbError {
    #[error("ADB not found")]
    NotFound,
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    #[error("No online device connected")]
    NoDevice,
    #[error("ADB command failed: {0}")]
    CommandFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inbox content URI
const SMS_INBOX_URI: &str = "content://sms/inbox";

/// ADB Client
#[derive(Debug, Clone)]
pub struct AdbClient {
    adb: PathBuf,
}

impl AdbClient {
    /// Create a client using the `adb` binary of the SDK at `sdk_path`
    pub fn new(sdk_path: &Path) -> Self {
        Self {
            adb: adb_in_sdk(sdk_path),
        }
    }

    /// Locate `adb`: explicit SDK path, then `ANDROID_HOME`,
    /// `ANDROID_SDK_ROOT`, `~/Android/Sdk`, and finally whatever `adb`
    /// is on `PATH`.
    pub fn detect(sdk_path: Option<&Path>) -> Self {
        let candidates = sdk_path
            .map(Path::to_path_buf)
            .into_iter()
            .chain(std::env::var_os("ANDROID_HOME").map(PathBuf::from))
            .chain(std::env::var_os("ANDROID_SDK_ROOT").map(PathBuf::from))
            .chain(dirs::home_dir().map(|h| h.join("Android").join("Sdk")));

        for sdk in candidates {
            let adb = adb_in_sdk(&sdk);
            if adb.exists() {
                debug!("Using adb at {:?}", adb);
                return Self { adb };
            }
        }

        debug!("No SDK adb found, falling back to PATH");
        Self {
            adb: PathBuf::from(if cfg!(windows) { "adb.exe" } else { "adb" }),
        }
    }

    /// Path of the `adb` executable in use
    pub fn adb_path(&self) -> &Path {
        &self.adb
    }

    /// Run an ADB command
    async fn run(&self, args: &[&str]) -> Result<String, AdbError> {
        debug!("adb {:?}", args);

        let output = match Command::new(&self.adb).args(args).output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AdbError::NotFound),
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdbError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run an ADB command for a specific device
    async fn run_for_device(&self, serial: &str, args: &[&str]) -> Result<String, AdbError> {
        let mut full_args = vec!["-s", serial];
        full_args.extend(args);
        self.run(&full_args).await
    }

    /// Run a shell command with multiple arguments
    pub async fn shell_args(&self, serial: &str, args: &[&str]) -> Result<String, AdbError> {
        let mut full_args = vec!["shell"];
        full_args.extend(args);
        self.run_for_device(serial, &full_args).await
    }

    /// List connected devices
    pub async fn list_devices(&self) -> Result<Vec<Device>, AdbError> {
        let output = self.run(&["devices", "-l"]).await?;
        Ok(parse_devices(&output))
    }

    /// Resolve the device to talk to: `serial` if given and online,
    /// otherwise the first online device.
    pub async fn select_device(&self, serial: Option<&str>) -> Result<Device, AdbError> {
        let devices = self.list_devices().await?;
        match serial {
            Some(serial) => devices
                .into_iter()
                .find(|d| d.serial == serial && d.is_usable())
                .ok_or_else(|| AdbError::DeviceNotFound(serial.to_string())),
            None => devices
                .into_iter()
                .find(Device::is_usable)
                .ok_or(AdbError::NoDevice),
        }
    }

    /// Read inbox messages, only those with an id above `after_id` when given
    pub async fn query_inbox(&self, serial: &str, after_id: Option<u64>) -> Result<Vec<SmsRecord>, AdbError> {
        // quoted for the device shell, `>` would redirect otherwise
        let condition = after_id.map(|id| format!("\"_id>{}\"", id));

        let mut args = vec![
            "content",
            "query",
            "--uri",
            SMS_INBOX_URI,
            "--projection",
            "_id:address:body",
        ];
        if let Some(condition) = &condition {
            args.push("--where");
            args.push(condition);
        }

        let output = self.shell_args(serial, &args).await?;
        check_shell_output(&output)?;
        Ok(parse_query_output(&output))
    }

    /// Delete one message from the device.
    ///
    /// Recent Android versions only let the default SMS app write to the
    /// provider, so this can fail on devices where the filter is not that app.
    pub async fn delete_sms(&self, serial: &str, id: u64) -> Result<(), AdbError> {
        let uri = format!("content://sms/{}", id);
        let output = self.shell_args(serial, &["content", "delete", "--uri", &uri]).await?;
        check_shell_output(&output)
    }

    /// Deliver a text message to an emulator as if it came from `sender`
    pub async fn emulator_send_sms(&self, serial: &str, sender: &str, body: &str) -> Result<(), AdbError> {
        if !serial.starts_with("emulator-") {
            return Err(AdbError::CommandFailed(format!("{} is not an emulator", serial)));
        }
        let output = self.run_for_device(serial, &["emu", "sms", "send", sender, body]).await?;
        if output.contains("KO") {
            return Err(AdbError::CommandFailed(output.trim().to_string()));
        }
        Ok(())
    }
}

/// `adb shell` reports provider failures on stdout with a zero exit status.
/// Only the first line is inspected, later lines may be message bodies. A
/// first line holding a query row is data, whatever its body says.
fn check_shell_output(output: &str) -> Result<(), AdbError> {
    let failure = output
        .lines()
        .find(|line| !line.trim().is_empty())
        .filter(|line| !line.starts_with("Row: "))
        .filter(|line| line.starts_with("Error") || line.contains("Exception"));
    match failure {
        Some(line) => {
            warn!("Device command failed: {}", line);
            Err(AdbError::CommandFailed(line.trim().to_string()))
        }
        None => Ok(()),
    }
}

fn adb_in_sdk(sdk_path: &Path) -> PathBuf {
    let platform_tools = sdk_path.join("platform-tools");
    if cfg!(windows) {
        platform_tools.join("adb.exe")
    } else {
        platform_tools.join("adb")
    }
}
