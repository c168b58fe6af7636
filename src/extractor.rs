use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Could not find <span id=\"{0}\">...</span>")]
    NotFound(String),

    #[error("Cannot build a pattern for element id {id:?}: {reason}")]
    InvalidPattern { id: String, reason: String },
}

/// Finds `<span id="...">123</span>` with a single pattern scan instead of a
/// DOM parse. Tag and attribute names match case-insensitively, other
/// attributes may appear on either side of `id`, and the element body must
/// be ASCII digits only.
#[derive(Debug, Clone)]
pub struct ValueExtractor {
    element_id: String,
    pattern: Regex,
}

impl ValueExtractor {
    pub fn new(element_id: &str) -> Result<Self, ExtractionError> {
        let source = format!(
            r#"<span[^>]*id=["']{}["'][^>]*>([0-9]+)</span>"#,
            regex::escape(element_id)
        );
        // Escaping rules out syntax errors, but a huge id can still exceed
        // the compiled size limit.
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| ExtractionError::InvalidPattern {
                id: element_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            element_id: element_id.to_string(),
            pattern,
        })
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Returns the value of the first matching element.
    pub fn extract(&self, html: &str) -> Result<i64, ExtractionError> {
        self.pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse::<i64>().ok())
            .ok_or_else(|| ExtractionError::NotFound(self.element_id.clone()))
    }
}
