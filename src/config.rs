//! Client configuration
//!
//! Loaded from YAML (or built in code) and validated once before the client
//! starts:
//!
//! ```yaml
//! host: 192.168.1.1
//! username: admin
//! password: secret
//! verify_ssl: false
//! subscribed_kinds: [camera, event]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::types::{MAX_EVENT_HISTORY_IN_STATE_MACHINE, ModelKind};
use crate::{ProtectError, Result};

const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub verify_ssl: bool,
    /// Reconnect when no message arrives for this long.
    pub idle_timeout_secs: u64,
    pub reconnect_wait_secs: u64,
    /// How long `connect` waits for the first message.
    pub connect_wait_secs: u64,
    /// `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
    pub max_event_history: usize,
    /// Only apply packets for these kinds. `None` applies everything.
    pub subscribed_kinds: Option<BTreeSet<ModelKind>>,
    /// IANA timezone name; falls back to the NVR's own setting.
    pub timezone: Option<String>,
    /// Re-fetch the bootstrap after every reconnect.
    pub resync_on_reconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 443,
            username: String::new(),
            password: String::new(),
            verify_ssl: true,
            idle_timeout_secs: 30,
            reconnect_wait_secs: 10,
            connect_wait_secs: 5,
            max_reconnect_attempts: None,
            max_event_history: MAX_EVENT_HISTORY_IN_STATE_MACHINE,
            subscribed_kinds: None,
            timezone: None,
            resync_on_reconnect: true,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { host: host.into(), username: username.into(), password: password.into(), ..Self::default() }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| ProtectError::config(format!("YAML parsing failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ProtectError::config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ProtectError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(ProtectError::config("port must be non-zero"));
        }
        if self.idle_timeout_secs == 0 {
            return Err(ProtectError::config("idle_timeout_secs must be at least 1"));
        }
        if self.connect_wait_secs == 0 {
            return Err(ProtectError::config("connect_wait_secs must be at least 1"));
        }
        if self.max_event_history == 0 {
            return Err(ProtectError::config("max_event_history must be at least 1"));
        }
        if matches!(&self.subscribed_kinds, Some(kinds) if kinds.is_empty()) {
            return Err(ProtectError::config("subscribed_kinds must not be empty; omit it to receive everything"));
        }
        if matches!(&self.timezone, Some(tz) if tz.trim().is_empty()) {
            return Err(ProtectError::config("timezone must not be empty"));
        }
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn reconnect_wait(&self) -> Duration {
        Duration::from_secs(self.reconnect_wait_secs)
    }

    pub fn connect_wait(&self) -> Duration {
        Duration::from_secs(self.connect_wait_secs)
    }

    fn origin(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of the REST API, ending in a slash.
    pub fn api_base_url(&self) -> String {
        format!("https://{}/proxy/protect/api/", self.origin())
    }

    pub fn login_url(&self) -> String {
        format!("https://{}/api/auth/login", self.origin())
    }

    pub fn websocket_url(&self, last_update_id: Uuid) -> String {
        format!("wss://{}/proxy/protect/ws/updates?lastUpdateId={}", self.origin(), last_update_id)
    }

    /// Timezone to use: configured value, else the NVR's, else UTC.
    pub fn resolve_timezone(&self, nvr_timezone: Option<&str>) -> String {
        self.timezone.as_deref().or(nvr_timezone).unwrap_or(DEFAULT_TIMEZONE).to_string()
    }
}
