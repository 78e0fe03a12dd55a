use crate::record::JsonObject;
use crate::{ConfigError, ParseError};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// One parsed line of a JSON Lines file
#[derive(Debug, Clone, PartialEq)]
pub struct JsonlRecord {
    /// 1-based line number in the source file
    pub line: usize,
    pub value: JsonObject,
}

impl JsonlRecord {
    pub fn name(&self) -> Option<&str> {
        self.value.get("name").and_then(Value::as_str)
    }

    pub fn to_line(&self) -> String {
        Value::Object(self.value.clone()).to_string()
    }
}

/// The usable records of a JSON Lines file and the lines that were skipped
#[derive(Debug, Default)]
pub struct JsonlDocument {
    pub records: Vec<JsonlRecord>,
    pub skipped: Vec<ParseError>,
}

/// Reads a JSON Lines file
///
/// Blank lines are ignored. Lines that are not a JSON object are skipped with
/// a warning naming the line number. A missing file is a [`ConfigError`].
pub fn read_jsonl(path: &Path) -> Result<JsonlDocument, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::MissingInput(path.to_path_buf()))
        }
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let document = parse_jsonl(&content);
    for error in &document.skipped {
        tracing::warn!("{}: skipping {}", path.display(), error);
    }
    Ok(document)
}

/// Parses JSON Lines content
pub fn parse_jsonl(content: &str) -> JsonlDocument {
    let mut document = JsonlDocument::default();

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(value)) => document.records.push(JsonlRecord { line, value }),
            Ok(_) => document.skipped.push(ParseError::Line {
                line,
                message: "not a JSON object".to_string(),
            }),
            Err(e) => document.skipped.push(ParseError::Line {
                line,
                message: e.to_string(),
            }),
        }
    }

    document
}
