use std::path::{Path, PathBuf};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use visit_tracker_lib::visit_record::VisitRecord;

use crate::DataManagerError;

/**
 * VisitLog is the append-only, newline-delimited JSON log of visit records.
 *
 * One record per line, oldest first on disk. No rotation, no compaction and
 * no locking: concurrent appends rely on the filesystem's append-mode
 * guarantees for small single-line writes.
 */
#[derive(Clone)]
pub struct VisitLog {
    path: PathBuf,
}

impl VisitLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes the record to one line and appends it to the log file,
    /// creating the file if it does not exist yet.
    pub async fn append(&self, record: &VisitRecord) -> Result<(), DataManagerError> {
        let mut line = serde_json::to_string(record)
            .map_err(|_| DataManagerError::Storage("Failed to serialize visit record".to_string()))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|_| DataManagerError::Storage(format!("Failed to open visit log: {:?}", self.path)))?;

        file.write_all(line.as_bytes()).await
            .map_err(|_| DataManagerError::Storage("Failed to write visit record to log".to_string()))?;

        Ok(())
    }

    /// Reads the whole log and returns the records most recent first.
    /// A missing file is an empty log, not an error. A single malformed
    /// line aborts the whole read.
    pub async fn read_all(&self) -> Result<Vec<VisitRecord>, DataManagerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = tokio::fs::read_to_string(&self.path).await
            .map_err(|_| DataManagerError::Storage(format!("Failed to read visit log: {:?}", self.path)))?;

        let mut records = Vec::new();
        for line in contents.lines() {
            let record = serde_json::from_str(line)
                .map_err(|_| DataManagerError::Parse(format!("Malformed line in visit log: {line}")))?;
            records.push(record);
        }

        records.reverse();
        Ok(records)
    }
}
