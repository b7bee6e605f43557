// ============================================================
// Layer 4 — CSV Split Loader
// ============================================================
// Loads one dataset split from a CSV file with a header row.
//
//   text,intent
//   "what is my balance",check_balance
//   "pay my electricity bill",pay_bill
//
// The two column names are configurable (defaults `text` and
// `intent`). Other columns are ignored and column order does
// not matter.
//
// Every text and intent cell goes through the Preprocessor,
// so stray whitespace never reaches the tokenizer or the
// label registry.
//
// Failures:
//   missing file / unreadable   → IntentError::Io
//   malformed CSV row           → IntentError::Csv
//   column absent from header   → IntentError::Schema
//   no split path configured    → IntentError::InvalidConfig
//
// Reference: csv crate documentation (ReaderBuilder)
//            Rust Book §9 (Error Handling)

use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::domain::error::IntentError;
use crate::domain::traits::SplitSource;
use crate::domain::utterance::{Split, SplitKind, Utterance};

pub const DEFAULT_TEXT_COLUMN: &str = "text";
pub const DEFAULT_INTENT_COLUMN: &str = "intent";

/// Implements SplitSource over one CSV file per split.
pub struct CsvSplitLoader {
    paths:         BTreeMap<SplitKind, PathBuf>,
    text_column:   String,
    intent_column: String,
    preprocessor:  Preprocessor,
}

impl CsvSplitLoader {
    pub fn new(text_column: impl Into<String>, intent_column: impl Into<String>) -> Self {
        Self {
            paths:         BTreeMap::new(),
            text_column:   text_column.into(),
            intent_column: intent_column.into(),
            preprocessor:  Preprocessor::new(),
        }
    }

    pub fn with_path(mut self, kind: SplitKind, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(kind, path.into());
        self
    }

    /// Whether a path is configured for `kind` and the file exists.
    pub fn has_split(&self, kind: SplitKind) -> bool {
        self.paths.get(&kind).is_some_and(|p| p.is_file())
    }

    fn read(&self, kind: SplitKind, path: &Path) -> Result<Split, IntentError> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                IntentError::schema(
                    kind,
                    format!("column '{}' not found in {}", name, path.display()),
                )
            })
        };
        let text_idx   = column(&self.text_column)?;
        let intent_idx = column(&self.intent_column)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let text   = record.get(text_idx).unwrap_or_default();
            let intent = record.get(intent_idx).unwrap_or_default();
            rows.push(Utterance::new(
                self.preprocessor.clean(text),
                self.preprocessor.clean(intent),
            ));
        }

        Ok(Split::new(kind, rows))
    }
}

impl SplitSource for CsvSplitLoader {
    fn load_split(&self, kind: SplitKind) -> Result<Split, IntentError> {
        let path = self.paths.get(&kind).ok_or_else(|| {
            IntentError::InvalidConfig(format!("no path configured for the {kind} split"))
        })?;

        let split = self.read(kind, path)?;
        tracing::info!("Loaded {} {} rows from '{}'", split.len(), kind, path.display());
        Ok(split)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_loads_and_cleans_rows() {
        let file   = csv_file("id,intent,text\n1,greet,\"  hello   world \"\n2, billing ,pay my bill\n");
        let loader = CsvSplitLoader::new("text", "intent").with_path(SplitKind::Training, file.path());

        let split = loader.load_split(SplitKind::Training).unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split.rows()[0], Utterance::new("hello world", "greet"));
        assert_eq!(split.rows()[1].intent, "billing");
    }

    #[test]
    fn test_custom_column_names() {
        let file   = csv_file("utterance,label\nhi there,greet\n");
        let loader = CsvSplitLoader::new("utterance", "label").with_path(SplitKind::Testing, file.path());
        let split  = loader.load_split(SplitKind::Testing).unwrap();
        assert_eq!(split.rows()[0].text, "hi there");
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let file   = csv_file("text,label\nhi,greet\n");
        let loader = CsvSplitLoader::new("text", "intent").with_path(SplitKind::Evaluation, file.path());
        let err    = loader.load_split(SplitKind::Evaluation).unwrap_err();
        assert!(matches!(err, IntentError::Schema { split: SplitKind::Evaluation, .. }));
    }

    #[test]
    fn test_unconfigured_split_is_config_error() {
        let loader = CsvSplitLoader::new("text", "intent");
        assert!(matches!(
            loader.load_split(SplitKind::Regression),
            Err(IntentError::InvalidConfig(_))
        ));
        assert!(!loader.has_split(SplitKind::Regression));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let loader = CsvSplitLoader::new("text", "intent")
            .with_path(SplitKind::Training, "/nonexistent/train.csv");
        assert!(matches!(
            loader.load_split(SplitKind::Training),
            Err(IntentError::Io(_))
        ));
    }
}
