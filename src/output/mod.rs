use crate::error::Result;
use crate::monitor::RunResult;
use async_trait::async_trait;

pub mod console;
pub mod json;
pub mod key_value;

#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn write(&mut self, result: &RunResult) -> Result<()>;
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Hands the result to every handler. A failing sink is logged and skipped so
/// the remaining sinks still receive the result.
pub async fn emit_all(handlers: &mut [Box<dyn OutputHandler>], result: &RunResult) {
    for handler in handlers.iter_mut() {
        if let Err(e) = handler.write(result).await {
            log::error!("Error writing run result: {}", e);
        }
        if let Err(e) = handler.close().await {
            log::error!("Error closing output: {}", e);
        }
    }
}
