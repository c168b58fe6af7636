use crate::config::MonitorConfig;
use crate::error::Result;
use crate::extractor::ValueExtractor;
use crate::fetcher::Fetcher;
use crate::state::{StateLookup, StateStore};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Initialized,
    Changed,
    Unchanged,
    Failed,
}

/// What one cycle observed. Failures are a status, not an `Err`, so the caller
/// decides whether they affect the exit code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub status: RunStatus,
    pub changed: bool,
    pub old: Option<i64>,
    pub current: Option<i64>,
    pub timestamp: String,
    pub url: String,
    pub message: String,
}

impl RunResult {
    pub fn is_error(&self) -> bool {
        self.status == RunStatus::Failed
    }

    /// Reported fields in emission order. Missing numbers become empty strings.
    pub fn fields(&self) -> [(&'static str, String); 6] {
        let number = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_default();
        [
            ("changed", self.changed.to_string()),
            ("old", number(self.old)),
            ("current", number(self.current)),
            ("timestamp", self.timestamp.clone()),
            ("url", self.url.clone()),
            ("message", self.message.clone()),
        ]
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-19T08:00:00.000Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct Monitor {
    config: MonitorConfig,
    fetcher: Arc<dyn Fetcher>,
    store: StateStore,
}

impl Monitor {
    pub fn new(config: MonitorConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let store = StateStore::new(config.state_path.clone());

        Self {
            config,
            fetcher,
            store,
        }
    }

    /// Runs one fetch, extract, compare cycle. Never returns an error; a
    /// failed cycle is reported as `RunStatus::Failed`.
    pub async fn run(&self) -> RunResult {
        let timestamp = now_iso();

        match self.check(&timestamp).await {
            Ok(result) => {
                log::debug!("{:?} run: {}", result.status, result.message);
                result
            }
            Err(e) => {
                log::debug!("Run failed: {:?}", e);
                RunResult {
                    status: RunStatus::Failed,
                    changed: false,
                    old: None,
                    current: None,
                    timestamp,
                    url: self.config.url.clone(),
                    message: format!("Error: {}", e),
                }
            }
        }
    }

    async fn check(&self, timestamp: &str) -> Result<RunResult> {
        log::info!("Fetching {} ...", self.config.url);
        let extractor = ValueExtractor::new(&self.config.element_id)?;
        let html = self.fetcher.fetch(&self.config.url).await?;
        let current = extractor.extract(&html)?;
        log::debug!("Extracted {}={}", extractor.element_id(), current);

        let (status, old) = match self.store.read() {
            StateLookup::Absent => {
                self.store.write(current, now_iso())?;
                (RunStatus::Initialized, None)
            }
            StateLookup::Found(prev) => match prev.last_value() {
                Some(old) if old != current => {
                    self.store.write(current, now_iso())?;
                    (RunStatus::Changed, Some(old))
                }
                Some(old) => (RunStatus::Unchanged, Some(old)),
                // Only a numeric previous value can count as a change.
                None => {
                    log::warn!(
                        "Stored value {} in {} is not a number; leaving it untouched",
                        prev.last,
                        self.store.path().display()
                    );
                    (RunStatus::Unchanged, None)
                }
            },
        };

        let message = match status {
            RunStatus::Initialized => {
                format!("Initialized state with value={} at {}", current, timestamp)
            }
            RunStatus::Changed => format!(
                "Value changed: {} -> {} at {}",
                old.unwrap_or_default(),
                current,
                timestamp
            ),
            _ => format!("No change: still {} at {}", current, timestamp),
        };

        Ok(RunResult {
            status,
            changed: status == RunStatus::Changed,
            old,
            current: Some(current),
            timestamp: timestamp.to_string(),
            url: self.config.url.clone(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;

    struct StubFetcher {
        pages: Mutex<Vec<std::result::Result<String, u16>>>,
    }

    impl StubFetcher {
        fn new(pages: Vec<std::result::Result<String, u16>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages),
            })
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, _url: &str) -> std::result::Result<String, FetchError> {
            match self.pages.lock().unwrap().remove(0) {
                Ok(body) => Ok(body),
                Err(status) => Err(FetchError::Status {
                    status,
                    reason: "Service Unavailable".into(),
                }),
            }
        }
    }

    fn page(n: i64) -> std::result::Result<String, u16> {
        Ok(format!("<p>Total: <span id=\"eshop_total\">{}</span></p>", n))
    }

    fn monitor(dir: &tempfile::TempDir, fetcher: Arc<StubFetcher>) -> Monitor {
        let config = MonitorConfig {
            state_path: dir.path().join("state.json"),
            ..Default::default()
        };
        Monitor::new(config, fetcher)
    }

    #[tokio::test]
    async fn first_run_initializes_then_reports_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor(&dir, StubFetcher::new(vec![page(23), page(23)]));

        let first = monitor.run().await;
        assert_eq!(first.status, RunStatus::Initialized);
        assert!(!first.changed);
        assert_eq!(first.old, None);
        assert_eq!(first.current, Some(23));
        assert!(first.message.starts_with("Initialized state with value=23 at "));
        let written = fs::read_to_string(dir.path().join("state.json")).unwrap();

        let second = monitor.run().await;
        assert_eq!(second.status, RunStatus::Unchanged);
        assert!(!second.changed);
        assert_eq!(second.old, Some(23));
        assert_eq!(second.current, Some(23));
        assert!(second.message.starts_with("No change: still 23 at "));
        assert_eq!(
            fs::read_to_string(dir.path().join("state.json")).unwrap(),
            written
        );
    }

    #[tokio::test]
    async fn failure_leaves_state_alone() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor(&dir, StubFetcher::new(vec![page(4), Err(503)]));

        monitor.run().await;
        let before = fs::read_to_string(dir.path().join("state.json")).unwrap();

        let result = monitor.run().await;
        assert!(result.is_error());
        assert!(!result.changed);
        assert_eq!(result.old, None);
        assert_eq!(result.current, None);
        assert_eq!(result.message, "Error: HTTP 503 Service Unavailable");
        assert_eq!(
            fs::read_to_string(dir.path().join("state.json")).unwrap(),
            before
        );
    }

    #[tokio::test]
    async fn loosely_typed_equal_state_is_not_rewritten() {
        for raw in [
            r#"{"last": "23"}"#,
            r#"{"last": 23.0}"#,
            r#"{"last": 23, "updatedAt": null}"#,
        ] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("state.json");
            fs::write(&path, raw).unwrap();

            let result = monitor(&dir, StubFetcher::new(vec![page(23)])).run().await;

            assert_eq!(result.status, RunStatus::Unchanged, "state {raw}");
            assert!(!result.changed);
            assert_eq!(result.old, Some(23));
            assert_eq!(result.current, Some(23));
            assert_eq!(fs::read_to_string(&path).unwrap(), raw);
        }
    }

    #[tokio::test]
    async fn loosely_typed_different_state_is_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"last": "23"}"#).unwrap();

        let result = monitor(&dir, StubFetcher::new(vec![page(30)])).run().await;

        assert_eq!(result.status, RunStatus::Changed);
        assert_eq!(result.old, Some(23));
        assert_eq!(result.current, Some(30));
        let state: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(state["last"], 30);
    }

    #[tokio::test]
    async fn non_numeric_state_reports_no_change_and_keeps_file() {
        for raw in [r#"{"last": "many"}"#, r#"{"last": null}"#, r#"{"updatedAt": "x"}"#] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("state.json");
            fs::write(&path, raw).unwrap();

            let result = monitor(&dir, StubFetcher::new(vec![page(23)])).run().await;

            assert_eq!(result.status, RunStatus::Unchanged, "state {raw}");
            assert!(!result.changed);
            assert_eq!(result.old, None);
            assert_eq!(result.current, Some(23));
            assert_eq!(fs::read_to_string(&path).unwrap(), raw);
        }
    }

    #[tokio::test]
    async fn oversized_element_id_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = MonitorConfig {
            element_id: "x".repeat(2_000_000),
            state_path: dir.path().join("state.json"),
            ..Default::default()
        };

        let result = Monitor::new(config, StubFetcher::new(vec![page(1)])).run().await;

        assert!(result.is_error());
        assert!(result.message.starts_with("Error: Cannot build a pattern"));
        assert!(!dir.path().join("state.json").exists());
    }

    #[test]
    fn fields_render_empty_numbers() {
        let result = RunResult {
            status: RunStatus::Failed,
            changed: false,
            old: None,
            current: None,
            timestamp: "t".into(),
            url: "u".into(),
            message: "Error: x".into(),
        };
        let fields = result.fields();
        assert_eq!(fields[0], ("changed", "false".to_string()));
        assert_eq!(fields[1], ("old", String::new()));
        assert_eq!(fields[2], ("current", String::new()));
        assert_eq!(fields[5], ("message", "Error: x".to_string()));
    }

    #[test]
    fn timestamps_have_millisecond_precision() {
        let ts = now_iso();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2026-10-19T08:00:00.000Z".len());
    }
}
