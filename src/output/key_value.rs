use super::OutputHandler;
use crate::error::Result;
use crate::monitor::RunResult;
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    Upper,
    Lower,
}

impl KeyCase {
    fn apply(self, key: &str) -> String {
        match self {
            KeyCase::Upper => key.to_uppercase(),
            KeyCase::Lower => key.to_lowercase(),
        }
    }
}

/// Appends `KEY=value` lines to a scheduler-provided file such as the one
/// named by `GITHUB_ENV` or `GITHUB_OUTPUT`. With no path the handler does
/// nothing, which is the normal case outside the scheduler.
pub struct KeyValueFileOutput {
    path: Option<PathBuf>,
    case: KeyCase,
}

impl KeyValueFileOutput {
    pub fn new(path: Option<PathBuf>, case: KeyCase) -> Self {
        Self { path, case }
    }

    /// Persistent environment sink: upper-case keys.
    pub fn env(path: Option<PathBuf>) -> Self {
        Self::new(path, KeyCase::Upper)
    }

    /// Step output sink: lower-case keys.
    pub fn step_output(path: Option<PathBuf>) -> Self {
        Self::new(path, KeyCase::Lower)
    }

    pub fn render(&self, result: &RunResult) -> String {
        result
            .fields()
            .iter()
            .map(|(key, value)| format!("{}={}\n", self.case.apply(key), sanitize(value)))
            .collect()
    }
}

/// Newlines would start a new `KEY=value` entry in the sink, so they
/// collapse to a single space.
pub fn sanitize(value: &str) -> String {
    value.replace("\r\n", " ").replace('\n', " ")
}

#[async_trait]
impl OutputHandler for KeyValueFileOutput {
    async fn write(&mut self, result: &RunResult) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(self.render(result).as_bytes())?;
        Ok(())
    }
}
