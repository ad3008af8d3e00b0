//! JSON file store rooted at a directory.
//!
//! Layout:
//!
//! ```text
//! <root>/districts.json          array of districts (required)
//! <root>/towers.json             array of towers (optional)
//! <root>/schools.json            array of schools (optional)
//! <root>/hospitals.json          array of hospitals (optional)
//! <root>/coverage_results.json   current coverage results (written)
//! <root>/audit_log.jsonl         one audit entry per line (appended)
//! ```
//!
//! Missing infrastructure files read as empty lists. Result writes go
//! through a temporary file and a rename so readers never see a partial
//! array.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use infra_map_coverage_models::{
    AnalysisType, AuditEntry, CoverageResult, District, Hospital, School, Tower,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt as _;
use tokio::sync::Mutex;

use crate::{InfrastructureSource, ResultSink, StoreError, in_district, supersede};

/// District records.
pub const DISTRICTS_FILE: &str = "districts.json";
/// Tower records.
pub const TOWERS_FILE: &str = "towers.json";
/// School records.
pub const SCHOOLS_FILE: &str = "schools.json";
/// Hospital records.
pub const HOSPITALS_FILE: &str = "hospitals.json";
/// Persisted coverage results.
pub const RESULTS_FILE: &str = "coverage_results.json";
/// Audit trail, one JSON object per line.
pub const AUDIT_FILE: &str = "audit_log.jsonl";

/// Store backed by JSON files in one directory.
#[derive(Debug)]
pub struct JsonDirStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDirStore {
    /// Creates a store rooted at `root`. Nothing is read until first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The directory this store reads and writes.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_array<T: DeserializeOwned>(
        &self,
        file: &str,
        required: bool,
    ) -> Result<Vec<T>, StoreError> {
        let path = self.root.join(file);

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if required {
                    return Err(StoreError::NotFound {
                        what: path.display().to_string(),
                    });
                }
                log::debug!("{} does not exist, treating as empty", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|source| StoreError::Json { path, source })
    }

    async fn write_json<T: Serialize + Sync>(
        &self,
        file: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let path = self.root.join(file);
        let tmp_path = self.root.join(format!("{file}.tmp"));

        let body = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn read_filtered<T, F>(
        &self,
        file: &str,
        district_filter: Option<&str>,
        district_of: F,
    ) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned + Send,
        F: Fn(&T) -> &str + Send,
    {
        let mut records: Vec<T> = self.read_array(file, false).await?;
        records.retain(|r| in_district(district_of(r), district_filter));
        Ok(records)
    }
}

#[async_trait]
impl InfrastructureSource for JsonDirStore {
    async fn list_districts(&self) -> Result<Vec<District>, StoreError> {
        self.read_array(DISTRICTS_FILE, true).await
    }

    async fn list_towers(&self, district_filter: Option<&str>) -> Result<Vec<Tower>, StoreError> {
        self.read_filtered(TOWERS_FILE, district_filter, |t: &Tower| &t.district_id)
            .await
    }

    async fn list_schools(
        &self,
        district_filter: Option<&str>,
    ) -> Result<Vec<School>, StoreError> {
        self.read_filtered(SCHOOLS_FILE, district_filter, |s: &School| &s.district_id)
            .await
    }

    async fn list_hospitals(
        &self,
        district_filter: Option<&str>,
    ) -> Result<Vec<Hospital>, StoreError> {
        self.read_filtered(HOSPITALS_FILE, district_filter, |h: &Hospital| &h.district_id)
            .await
    }
}

#[async_trait]
impl ResultSink for JsonDirStore {
    async fn persist_coverage_results(&self, results: &[CoverageResult]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut existing: Vec<CoverageResult> = self.read_array(RESULTS_FILE, false).await?;
        let before = existing.len();
        supersede(&mut existing, results);
        self.write_json(RESULTS_FILE, &existing).await?;

        log::info!(
            "Persisted {} coverage results to {} ({} rows before, {} after)",
            results.len(),
            self.root.join(RESULTS_FILE).display(),
            before,
            existing.len()
        );
        Ok(())
    }

    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        let path = self.root.join(AUDIT_FILE);
        let mut line = serde_json::to_string(entry).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.root).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn list_coverage_results(
        &self,
        analysis_type: AnalysisType,
    ) -> Result<Vec<CoverageResult>, StoreError> {
        let mut results: Vec<CoverageResult> = self.read_array(RESULTS_FILE, false).await?;
        results.retain(|r| r.analysis_type == analysis_type);
        Ok(results)
    }
}
