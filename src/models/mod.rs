use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use utoipa::ToSchema;

/// One extracted line item. The service never inspects its fields and passes
/// records through in the order and shape the extractor produced them.
pub type ExtractionRecord = Map<String, Value>;

/// Which extractor is serving requests. Decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Production,
    Demo,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMode::Production => "production",
            ProcessingMode::Demo => "demo",
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, ProcessingMode::Production)
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub records: Vec<ExtractionRecord>,
    pub elapsed: Duration,
    pub mode: ProcessingMode,
}

impl ProcessingResult {
    pub fn items_count(&self) -> usize {
        self.records.len()
    }

    /// Elapsed wall-clock seconds rounded to two decimals, e.g. "2.01".
    pub fn elapsed_header(&self) -> String {
        format!("{:.2}", self.elapsed.as_secs_f64())
    }
}
