use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_URL: &str = "https://www.vmi.lt/pardavimai/lt/e-parduotuve";
pub const DEFAULT_ELEMENT_ID: &str = "eshop_total";
pub const DEFAULT_STATE_PATH: &str = "state.json";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; web-monitor/0.1; +https://github.com)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Everything one monitoring cycle needs to know. Built once per process and
/// handed to the monitor by reference; nothing reads it from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MonitorConfig {
    #[validate(url)]
    pub url: String,

    /// `id` attribute of the `<span>` holding the value.
    #[validate(length(min = 1, max = 256))]
    pub element_id: String,

    pub state_path: PathBuf,

    #[validate(length(min = 1))]
    pub user_agent: String,

    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,

    /// Exit non-zero when the run fails. Off by default so a flaky page does
    /// not fail the scheduled job.
    pub fail_on_error: bool,

    /// Optional file receiving the run result as JSON.
    pub summary_path: Option<PathBuf>,
}

impl MonitorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            element_id: DEFAULT_ELEMENT_ID.to_string(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            fail_on_error: false,
            summary_path: None,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub url: Option<String>,
    pub element_id: Option<String>,
    pub state_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub fail_on_error: bool,
    pub summary_path: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: MonitorConfig) -> MonitorConfig {
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(element_id) = self.element_id {
            config.element_id = element_id;
        }
        if let Some(state_path) = self.state_path {
            config.state_path = state_path;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if self.fail_on_error {
            config.fail_on_error = true;
        }
        if self.summary_path.is_some() {
            config.summary_path = self.summary_path;
        }
        config
    }
}
