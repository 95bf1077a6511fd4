//! Record repository abstraction.
//!
//! The request pipeline only talks to a [`ReportRepository`]; the repository
//! owns id assignment and must make it atomic and monotonic.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::report::{NewReport, Report};
use crate::storage::{Storage, StorageStats};

/// Durable storage for reports keyed by an auto-assigned integer id.
#[async_trait::async_trait]
pub trait ReportRepository: Send + Sync {
    /// Persist a new report and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable or the write fails.
    async fn create(&self, report: NewReport) -> Result<Report>;

    /// Fetch a report by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    async fn get(&self, id: i64) -> Result<Option<Report>>;

    /// Fetch every report in repository iteration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unavailable.
    async fn list(&self) -> Result<Vec<Report>>;

    /// Replace the raw text of an existing report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no report has this id, or an error if
    /// the write fails.
    async fn update(&self, id: i64, raw: String) -> Result<()>;
}

/// [`ReportRepository`] backed by the `SQLite` [`Storage`].
///
/// The connection is shared behind a mutex and every call runs on the
/// blocking thread pool.
#[derive(Debug, Clone)]
pub struct SqliteReportRepository {
    storage: Arc<Mutex<Storage>>,
    path: PathBuf,
}

impl SqliteReportRepository {
    /// Wrap an opened storage.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        let path = storage.path().to_path_buf();
        Self {
            storage: Arc::new(Mutex::new(storage)),
            path,
        }
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Storage::open(path).map(Self::new)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Storage::open_in_memory().map(Self::new)
    }

    /// Path of the underlying database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn stats(&self) -> Result<StorageStats> {
        self.with_storage(|storage| storage.stats()).await
    }

    async fn with_storage<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| Error::internal("storage lock poisoned"))?;
            op(&guard)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
    }
}

#[async_trait::async_trait]
impl ReportRepository for SqliteReportRepository {
    async fn create(&self, report: NewReport) -> Result<Report> {
        self.with_storage(move |storage| storage.insert(&report))
            .await
    }

    async fn get(&self, id: i64) -> Result<Option<Report>> {
        self.with_storage(move |storage| storage.get(id)).await
    }

    async fn list(&self) -> Result<Vec<Report>> {
        self.with_storage(Storage::list).await
    }

    async fn update(&self, id: i64, raw: String) -> Result<()> {
        let updated = self
            .with_storage(move |storage| storage.update_raw(id, &raw))
            .await?;
        if updated {
            Ok(())
        } else {
            Err(Error::not_found(id))
        }
    }
}
