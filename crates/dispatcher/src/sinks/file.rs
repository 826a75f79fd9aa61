//! FileSink - appends log batches to a JSON-lines file

use contracts::{ContractError, LogRecord, PersistentLogSink};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file; created if missing, always appended to
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .ok_or_else(|| "missing 'path' parameter".to_string())?;

        Ok(Self { path })
    }
}

/// Sink that appends one JSON object per record
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    file: Option<File>,
}

impl FileSink {
    /// Create a new FileSink
    pub async fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;

        Ok(Self {
            name: name.into(),
            config,
            file: Some(file),
        })
    }

    /// Create from params map (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = FileSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_connection(&name, e))?;
        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))
    }

    fn encode(&self, records: &[LogRecord]) -> Result<Vec<u8>, ContractError> {
        let mut buf = Vec::with_capacity(records.len() * 256);
        for record in records {
            serde_json::to_writer(&mut buf, record)
                .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}")))?;
            buf.push(b'\n');
        }
        Ok(buf)
    }
}

impl PersistentLogSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write_batch",
        skip(self, records),
        fields(sink = %self.name, records = records.len())
    )]
    async fn write_batch(&mut self, records: &[LogRecord]) -> Result<(), ContractError> {
        let buf = self.encode(records)?;
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "file closed"))?;

        // One write per batch keeps a batch contiguous in the file
        file.write_all(&buf).await?;
        file.flush().await?;

        debug!(
            sink = %self.name,
            path = %self.config.path.display(),
            bytes = buf.len(),
            "Batch appended"
        );
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut file) = self.file.take() {
            file.sync_all().await?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{Severity, TelemetryEvent};
    use tempfile::tempdir;

    fn record(action: &str) -> LogRecord {
        LogRecord::from_event(
            TelemetryEvent::new("UPLOAD", action, "file stored", Severity::Success),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_file_sink_appends_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");
        let params = HashMap::from([("path".to_string(), path.display().to_string())]);

        let mut sink = FileSink::from_params("disk", &params).await.unwrap();
        sink.write_batch(&[record("a"), record("b")]).await.unwrap();
        sink.write_batch(&[record("c")]).await.unwrap();
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let actions: Vec<String> = content
            .lines()
            .map(|line| serde_json::from_str::<LogRecord>(line).unwrap().action)
            .collect();
        assert_eq!(actions, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_file_sink_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let config = FileSinkConfig {
            path: dir.path().join("events.jsonl"),
        };
        let mut sink = FileSink::new("disk", config).await.unwrap();
        sink.close().await.unwrap();

        let result = sink.write_batch(&[record("late")]).await;
        assert!(matches!(result, Err(ContractError::SinkWrite { .. })));
    }

    #[test]
    fn test_missing_path_param() {
        assert!(FileSinkConfig::from_params(&HashMap::new()).is_err());
    }
}
