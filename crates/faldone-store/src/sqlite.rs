//! SQLite-backed document store.
//!
//! Every document row is paired with an FTS4 index entry. The pairing is kept
//! by triggers, and each mutation additionally runs in its own transaction so
//! a failure rolls back the row and the entry together.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::{APPLICATION_ID, FTS_DOCSIZE_TABLE, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL, SCHEMA_SQL};
use crate::types::*;
use faldone_core::{Error, Result};

/// How long a writer waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Single-file document archive with its full-text index.
pub struct DocumentStore {
    pub(crate) conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DocumentStore {
    /// Open the store at `path`, creating it if the file does not exist.
    ///
    /// A pre-existing file must carry the faldone application id, otherwise
    /// this fails with [`Error::InvalidStoreFile`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let create_schema = !db_path.exists();
        if create_schema {
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Self::create_connection(&db_path)?;
        if create_schema {
            info!("Creating faldone at '{}'", db_path.display());
            Self::init_schema(&mut conn)?;
        }
        Self::validate_application_id(&conn, &db_path)?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        info!(
            "DocumentStore opened: {} documents, path={}",
            store.count()?,
            store.db_path.display()
        );
        Ok(store)
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    fn init_schema(conn: &mut Connection) -> Result<()> {
        let full_schema = format!("{}\n{}\n{}", SCHEMA_SQL, FTS_SCHEMA_SQL, FTS_TRIGGERS_SQL);
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;
        tx.execute_batch(&full_schema)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;
        tx.pragma_update(None, "application_id", APPLICATION_ID)
            .map_err(|e| Error::Database(e.to_string()))?;
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        Ok(())
    }

    fn validate_application_id(conn: &Connection, db_path: &Path) -> Result<()> {
        let invalid = || Error::InvalidStoreFile(db_path.display().to_string());
        let id: i64 = conn
            .pragma_query_value(None, "application_id", |row| row.get(0))
            .map_err(|e| {
                debug!("Reading application_id of {} failed: {}", db_path.display(), e);
                invalid()
            })?;
        if id != APPLICATION_ID {
            debug!(
                "{} has application_id {:#x}, expected {:#x}",
                db_path.display(),
                id,
                APPLICATION_ID
            );
            return Err(invalid());
        }
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    // ---------------------------------------------------------------
    // Document CRUD
    // ---------------------------------------------------------------

    /// Insert a document and its index entry. Returns the new document ID.
    pub fn insert(&self, doc: &NewDocument<'_>) -> Result<i64> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;
        let id = tx
            .prepare_cached(
                "INSERT INTO documents (title, labels, mime, text_data, raw_data) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![doc.title, doc.labels, doc.mime, doc.text, doc.raw])
            .map_err(|e| Error::Database(e.to_string()))?;
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!("Inserted document {} ({}, {} bytes)", id, doc.mime, doc.raw.len());
        Ok(id)
    }

    /// Delete a document and its index entry.
    pub fn delete(&self, id: i64) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(e.to_string()))?;
        let count = tx
            .execute("DELETE FROM documents WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(e.to_string()))?;
        if count == 0 {
            return Err(Error::NotFound(id));
        }
        tx.commit().map_err(|e| Error::Database(e.to_string()))?;
        debug!("Deleted document {}", id);
        Ok(())
    }

    /// Get a document by ID, payload included.
    pub fn get(&self, id: i64) -> Result<Document> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT id, title, labels, mime, text_data, raw_data FROM documents WHERE id = ?1",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], Self::row_to_document)
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        row.ok_or(Error::NotFound(id))
    }

    /// All documents in ascending id order, without payloads.
    pub fn list(&self) -> Result<Vec<DocumentSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT id, title, mime, labels FROM documents ORDER BY id ASC")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], Self::row_to_summary)
            .map_err(|e| Error::Database(e.to_string()))?;
        let docs = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(docs)
    }

    /// Documents carrying every label in `labels`, in ascending id order.
    ///
    /// An empty filter lists everything.
    pub fn list_labelled(&self, labels: &[&str]) -> Result<Vec<DocumentSummary>> {
        let mut docs = self.list()?;
        if !labels.is_empty() {
            docs.retain(|d| {
                let have: Vec<&str> = split_labels(&d.labels).collect();
                labels.iter().all(|want| have.contains(want))
            });
        }
        Ok(docs)
    }

    /// Count total documents.
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Index bookkeeping
    // ---------------------------------------------------------------

    /// Whether the full-text index holds an entry for `id`.
    ///
    /// Reads the index's own docsize table; selecting from `documents_idx`
    /// directly would consult the content table instead.
    pub fn index_entry_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE docid = ?1)", FTS_DOCSIZE_TABLE);
        let exists: bool = conn
            .query_row(&sql, params![id], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Number of entries in the full-text index.
    pub fn index_entry_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let sql = format!("SELECT COUNT(*) FROM {}", FTS_DOCSIZE_TABLE);
        let count: i64 = conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count)
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Get store statistics.
    pub fn stats(&self) -> Result<StoreStats> {
        let total_documents = self.count()?;
        let index_entries = self.index_entry_count()?;

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT COALESCE(mime, ''), COUNT(*) FROM documents GROUP BY mime ORDER BY mime",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let by_mime = stmt
            .query_map([], |row| {
                Ok(MimeCount {
                    mime: row.get(0)?,
                    documents: row.get(1)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::Database(e.to_string()))?;
        drop(stmt);
        drop(conn);

        let db_size = std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStats {
            total_documents,
            index_entries,
            by_mime,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    // ---------------------------------------------------------------
    // Row Mapping Helpers
    // ---------------------------------------------------------------

    fn row_to_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
        Ok(Document {
            id: row.get("id")?,
            title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
            labels: row.get::<_, Option<String>>("labels")?.unwrap_or_default(),
            mime: row.get::<_, Option<String>>("mime")?.unwrap_or_default(),
            text_data: row.get::<_, Option<String>>("text_data")?.unwrap_or_default(),
            raw_data: row.get::<_, Option<Vec<u8>>>("raw_data")?.unwrap_or_default(),
        })
    }

    fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentSummary> {
        Ok(DocumentSummary {
            id: row.get("id")?,
            title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
            mime: row.get::<_, Option<String>>("mime")?.unwrap_or_default(),
            labels: row.get::<_, Option<String>>("labels")?.unwrap_or_default(),
        })
    }
}
