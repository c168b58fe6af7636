use super::OutputHandler;
use crate::error::Result;
use crate::monitor::RunResult;
use async_trait::async_trait;

/// Prints the run message: stdout for normal outcomes, stderr for failures.
pub struct ConsoleOutput {
    prefix: String,
}

impl ConsoleOutput {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new("web-monitor")
    }
}

#[async_trait]
impl OutputHandler for ConsoleOutput {
    async fn write(&mut self, result: &RunResult) -> Result<()> {
        if result.is_error() {
            eprintln!("{}", result.message);
        } else {
            println!("[{}] {}", self.prefix, result.message);
        }
        Ok(())
    }
}
