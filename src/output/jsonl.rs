use crate::output::traits::{RecordSink, SinkResult, SinkReport};
use crate::record::EnrichedRecord;
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes records as JSON Lines, one object per line
///
/// The file is replaced on every write; parent directories are created as
/// needed.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes pre-serialized lines verbatim
    pub fn write_lines<'a>(&self, lines: impl IntoIterator<Item = &'a str>) -> SinkResult<usize> {
        let mut writer = self.create()?;
        let mut written = 0;
        for line in lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }

    fn create(&self) -> SinkResult<BufWriter<File>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(BufWriter::new(File::create(&self.path)?))
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn write_all(&mut self, records: &[EnrichedRecord]) -> SinkResult<SinkReport> {
        let lines: Vec<String> = records.iter().map(EnrichedRecord::to_line).collect();
        let written = self.write_lines(lines.iter().map(String::as_str))?;
        tracing::debug!("Wrote {} lines to {}", written, self.path.display());

        Ok(SinkReport {
            written,
            failed_batches: Vec::new(),
        })
    }
}
