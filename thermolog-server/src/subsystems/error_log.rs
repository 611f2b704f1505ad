//! Diagnostic error log
//!
//! Append-only CSV of `timestamp,message` lines for failed fetch, parse and
//! write attempts. Write-only: nothing in the service reads it back.

use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry. Failures are reported through tracing and swallowed.
    pub async fn record(&self, message: &str) {
        let line = format_entry(Utc::now(), message);
        if let Err(e) = self.append_line(&line).await {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to write to error log"
            );
        }
    }

    async fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

/// One CSV line. The message is flattened so each entry keeps two columns.
pub fn format_entry(at: DateTime<Utc>, message: &str) -> String {
    let flat: String = message
        .chars()
        .map(|c| match c {
            ',' => ';',
            '\n' | '\r' => ' ',
            c => c,
        })
        .collect();
    format!("{},{}\n", at.to_rfc3339_opts(SecondsFormat::Millis, true), flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_log_path() -> PathBuf {
        std::env::temp_dir()
            .join("thermolog-tests")
            .join(uuid::Uuid::new_v4().to_string())
            .join("log")
            .join("errorsLog.csv")
    }

    #[test]
    fn test_format_entry_flattens_message() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let line = format_entry(at, "bad, very bad\nthing");
        assert_eq!(line, "2024-03-01T12:00:00.000Z,bad; very bad thing\n");
        assert_eq!(line.trim_end().split(',').count(), 2);
    }

    #[tokio::test]
    async fn test_record_creates_parent_dirs_and_appends() {
        let path = temp_log_path();
        let log = ErrorLog::new(&path);

        log.record("first").await;
        log.record("second").await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(",first"));
        assert!(lines[1].ends_with(",second"));
    }

    #[tokio::test]
    async fn test_record_swallows_io_errors() {
        // A directory cannot be opened for append.
        let dir = std::env::temp_dir()
            .join("thermolog-tests")
            .join(uuid::Uuid::new_v4().to_string());
        std::fs::create_dir_all(&dir).unwrap();

        ErrorLog::new(&dir).record("ignored").await;
        assert!(dir.is_dir());
    }
}
