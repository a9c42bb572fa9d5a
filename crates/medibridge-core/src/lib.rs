//! MediBridge Core Library
//!
//! Doctor directory, patient chat sessions and doctor retrieval for the
//! MediBridge consultation assistant.
//!
//! # Architecture
//!
//! ```text
//!   patient message ──► orchestrator (medibridge-server)
//!                            │
//!          ┌─────────────────┼─────────────────────┐
//!          ▼                 ▼                     ▼
//!   reply + extraction   DoctorSearch          PatientSession
//!   (medibridge-llm)     (keyword strategy)    upsert, once per turn
//!                            │
//!                            ▼
//!                  hospitals / departments / doctors
//!                         (read-only SQLite)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite schema, directory queries, session upsert, seeding
//! - [`models`]: Domain types (Hospital, Department, Doctor, PatientSession, ...)
//! - [`search`]: Retrieval strategies behind the [`search::DoctorSearch`] trait
//! - [`audit`]: Offline data-quality audit of the directory

pub mod audit;
pub mod db;
pub mod models;
pub mod search;

// Re-export commonly used types
pub use audit::{audit_directory, AuditIssue};
pub use db::{Database, DbError, DbResult, DirectorySeed, SeedSummary};
pub use models::{
    ChatMessage, ChatRole, ConversationStage, Department, DepartmentHighlight, Doctor,
    DoctorListing, Hospital, PatientSession, Recommendation,
};
pub use search::{DoctorSearch, KeywordSearch};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of results for a directory keyword search.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Default number of results when listing a department's doctors.
pub const DEFAULT_DEPARTMENT_LIMIT: usize = 50;

// =========================================================================
// Error Type
// =========================================================================

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl CoreError {
    /// Whether the failure means the store is busy or unreachable.
    pub fn is_unavailable(&self) -> bool {
        match self {
            CoreError::Database(e) => e.is_unavailable(),
            CoreError::LockPoisoned(_) => false,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CoreError::LockPoisoned(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe handle over the database and the active search strategy.
///
/// Cloning is cheap; all clones share one connection.
#[derive(Clone)]
pub struct MediBridgeCore {
    db: Arc<Mutex<Database>>,
    search: Arc<dyn DoctorSearch>,
}

impl MediBridgeCore {
    /// Wrap an open database using keyword search.
    pub fn new(db: Database) -> Self {
        Self::with_search(db, Arc::new(KeywordSearch::new()))
    }

    /// Wrap an open database with a custom retrieval strategy.
    pub fn with_search(db: Database, search: Arc<dyn DoctorSearch>) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            search,
        }
    }

    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> CoreResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    fn db(&self) -> CoreResult<MutexGuard<'_, Database>> {
        Ok(self.db.lock()?)
    }

    /// Run a closure against the locked database.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> DbResult<T>) -> CoreResult<T> {
        let db = self.db()?;
        Ok(f(&db)?)
    }

    // =========================================================================
    // Directory Operations
    // =========================================================================

    /// Get a doctor with hospital and department, or `None` for an unknown id.
    pub fn get_doctor(&self, doctor_id: i64) -> CoreResult<Option<DoctorListing>> {
        self.with_db(|db| db.get_doctor_by_id(doctor_id))
    }

    /// Search the directory with the active strategy.
    pub fn search_doctors(
        &self,
        keywords: &[String],
        limit: usize,
    ) -> CoreResult<Vec<DoctorListing>> {
        let db = self.db()?;
        Ok(self.search.search(&db, keywords, limit)?)
    }

    /// Name of the active retrieval strategy.
    pub fn search_strategy(&self) -> &'static str {
        self.search.name()
    }

    pub fn doctors_by_department(
        &self,
        department_id: i64,
        limit: usize,
    ) -> CoreResult<Vec<DoctorListing>> {
        self.with_db(|db| db.doctors_by_department(department_id, limit))
    }

    pub fn list_hospitals(&self) -> CoreResult<Vec<Hospital>> {
        self.with_db(|db| db.list_hospitals())
    }

    pub fn departments_by_hospital(&self, hospital_id: i64) -> CoreResult<Vec<Department>> {
        self.with_db(|db| db.departments_by_hospital(hospital_id))
    }

    pub fn department_highlights(
        &self,
        limit_departments: usize,
        doctors_per_department: usize,
    ) -> CoreResult<Vec<DepartmentHighlight>> {
        self.with_db(|db| db.department_highlights(limit_departments, doctors_per_department))
    }

    /// Import a seed when the directory has no doctors yet.
    ///
    /// Returns `None` when the directory was already populated.
    pub fn seed_if_empty(&self, seed: &DirectorySeed) -> CoreResult<Option<SeedSummary>> {
        self.with_db(|db| {
            if db.count_doctors()? > 0 {
                return Ok(None);
            }
            db.import_seed(seed).map(Some)
        })
    }

    pub fn audit(&self) -> CoreResult<Vec<AuditIssue>> {
        self.with_db(audit_directory)
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Get a session, or `None` for an unknown id.
    pub fn get_session(&self, session_id: &str) -> CoreResult<Option<PatientSession>> {
        self.with_db(|db| db.get_session(session_id))
    }

    /// Create or update a session.
    pub fn upsert_session(&self, session: &PatientSession) -> CoreResult<()> {
        self.with_db(|db| db.upsert_session(session))
    }
}
