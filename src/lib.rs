pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod monitor;
pub mod output;
pub mod state;

pub use config::{ConfigLoader, ConfigOverrides, MonitorConfig};
pub use error::{Error, Result};
pub use extractor::{ExtractionError, ValueExtractor};
pub use fetcher::{FetchError, Fetcher, ReqwestFetcher};
pub use monitor::{Monitor, RunResult, RunStatus};
pub use state::{StateLookup, StateRecord, StateStore};
