use super::OutputHandler;
use crate::error::Result;
use crate::monitor::RunResult;
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Writes the latest run result as a JSON document, replacing any previous one.
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn write(&mut self, result: &RunResult) -> Result<()> {
        let mut file = File::create(&self.path)?;
        serde_json::to_writer_pretty(&mut file, result)?;
        writeln!(file)?;
        Ok(())
    }
}
