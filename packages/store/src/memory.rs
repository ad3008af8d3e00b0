//! In-memory store for tests and embedding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use infra_map_coverage_models::{
    AnalysisType, AuditEntry, CoverageResult, District, Hospital, School, Tower,
};

use crate::{InfrastructureSource, ResultSink, StoreError, in_district, supersede};

#[derive(Debug, Default)]
struct MemoryState {
    districts: Vec<District>,
    towers: Vec<Tower>,
    schools: Vec<School>,
    hospitals: Vec<Hospital>,
    results: Vec<CoverageResult>,
    audit: Vec<AuditEntry>,
}

/// Holds districts, infrastructure, results and audit entries in memory.
///
/// Writes can be switched off with [`MemoryStore::reject_writes`] to
/// exercise persistence failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_districts(mut self, districts: Vec<District>) -> Self {
        self.state_mut().districts = districts;
        self
    }

    #[must_use]
    pub fn with_towers(mut self, towers: Vec<Tower>) -> Self {
        self.state_mut().towers = towers;
        self
    }

    #[must_use]
    pub fn with_schools(mut self, schools: Vec<School>) -> Self {
        self.state_mut().schools = schools;
        self
    }

    #[must_use]
    pub fn with_hospitals(mut self, hospitals: Vec<Hospital>) -> Self {
        self.state_mut().hospitals = hospitals;
        self
    }

    /// When `reject` is true every write fails with
    /// [`StoreError::Rejected`].
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Snapshot of all persisted results.
    #[must_use]
    pub fn results(&self) -> Vec<CoverageResult> {
        self.lock().results.clone()
    }

    /// Snapshot of the audit trail, oldest first.
    #[must_use]
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.lock().audit.clone()
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self, what: &str) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected {
                message: format!("{what} writes are disabled"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl InfrastructureSource for MemoryStore {
    async fn list_districts(&self) -> Result<Vec<District>, StoreError> {
        Ok(self.lock().districts.clone())
    }

    async fn list_towers(&self, district_filter: Option<&str>) -> Result<Vec<Tower>, StoreError> {
        Ok(self
            .lock()
            .towers
            .iter()
            .filter(|t| in_district(&t.district_id, district_filter))
            .cloned()
            .collect())
    }

    async fn list_schools(
        &self,
        district_filter: Option<&str>,
    ) -> Result<Vec<School>, StoreError> {
        Ok(self
            .lock()
            .schools
            .iter()
            .filter(|s| in_district(&s.district_id, district_filter))
            .cloned()
            .collect())
    }

    async fn list_hospitals(
        &self,
        district_filter: Option<&str>,
    ) -> Result<Vec<Hospital>, StoreError> {
        Ok(self
            .lock()
            .hospitals
            .iter()
            .filter(|h| in_district(&h.district_id, district_filter))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResultSink for MemoryStore {
    async fn persist_coverage_results(&self, results: &[CoverageResult]) -> Result<(), StoreError> {
        self.check_writable("Coverage result")?;
        supersede(&mut self.lock().results, results);
        Ok(())
    }

    async fn record_audit(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.check_writable("Audit")?;
        self.lock().audit.push(entry.clone());
        Ok(())
    }

    async fn list_coverage_results(
        &self,
        analysis_type: AnalysisType,
    ) -> Result<Vec<CoverageResult>, StoreError> {
        Ok(self
            .lock()
            .results
            .iter()
            .filter(|r| r.analysis_type == analysis_type)
            .cloned()
            .collect())
    }
}
