//! Metric files on disk.
//!
//! One pretty-printed JSON file per metric under a single directory. Writes
//! go to a sibling temporary file that is then renamed over the target, so a
//! reader never observes a half-written metric. Raw upstream snapshots use
//! the same write path in their own directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::domain::MetricId;
use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct MetricStore {
    dir: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write `value` as pretty JSON to `dir/file_name` via a temporary sibling.
///
/// The temporary file never outlives a failed write.
fn write_json(dir: &Path, file_name: &str, value: &Value) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let target = dir.join(file_name);
    let tmp = dir.join(format!(".{file_name}.tmp"));

    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    if let Err(source) = write_synced(&tmp, &bytes).and_then(|()| fs::rename(&tmp, &target)) {
        let _ = fs::remove_file(&tmp);
        return Err(PipelineError::Io { path: target, source });
    }
    debug!(path = %target.display(), bytes = bytes.len(), "json file written");
    Ok(target)
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl MetricStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, metric: MetricId) -> PathBuf {
        self.dir.join(metric.file_name())
    }

    pub fn exists(&self, metric: MetricId) -> bool {
        self.path(metric).is_file()
    }

    /// Persist an already-validated metric object.
    pub fn write_metric(&self, metric: MetricId, value: &Value) -> Result<PathBuf, PipelineError> {
        write_json(&self.dir, metric.file_name(), value)
    }

    /// Parsed contents of a metric file.
    pub fn read(&self, metric: MetricId) -> Result<Value, PipelineError> {
        let path = self.path(metric);
        let raw = fs::read_to_string(&path).map_err(io_error(&path))?;
        let value = serde_json::from_str(&raw).map_err(|e| PipelineError::DataShape {
            context: metric.file_name().to_string(),
            message: e.to_string(),
        })?;
        Ok(value)
    }
}

/// Upstream payloads kept verbatim so a derivation can be audited or re-run.
#[derive(Debug, Clone)]
pub struct RawStore {
    dir: PathBuf,
}

impl RawStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn write_snapshot(&self, file_name: &str, value: &Value) -> Result<PathBuf, PipelineError> {
        write_json(&self.dir, file_name, value)
    }
}
