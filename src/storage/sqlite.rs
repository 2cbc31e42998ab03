//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{IndexRecord, LemmaRecord, PageRecord, SiteRecord};
use crate::SeekError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SeekError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SeekError> {
        let conn = init_database(path)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests and throwaway indexes)
    pub fn new_in_memory() -> Result<Self, SeekError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<SiteRecord> {
    Ok(SiteRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        name: row.get(2)?,
        status: SiteStatus::from_db_string(&row.get::<_, String>(3)?)
            .unwrap_or(SiteStatus::Failed),
        status_time: row.get(4)?,
        last_error: row.get(5)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        path: row.get(2)?,
        code: row.get(3)?,
        content: row.get(4)?,
    })
}

fn posting_from_row(row: &Row<'_>) -> rusqlite::Result<IndexRecord> {
    Ok(IndexRecord {
        page_id: row.get(0)?,
        lemma_id: row.get(1)?,
        rank: row.get(2)?,
    })
}

/// Removes a page, releasing its claim on every lemma it referenced
///
/// Lemmas whose frequency drops to zero are deleted with it.
fn remove_page(conn: &Connection, page_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE lemmas SET frequency = frequency - 1
         WHERE id IN (SELECT lemma_id FROM search_index WHERE page_id = ?1)",
        params![page_id],
    )?;
    conn.execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;
    conn.execute("DELETE FROM lemmas WHERE frequency <= 0", [])?;
    Ok(())
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn insert_site(
        &mut self,
        url: &str,
        name: &str,
        status: SiteStatus,
    ) -> StorageResult<SiteRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sites (url, name, status, status_time, last_error) VALUES (?1, ?2, ?3, ?4, '')",
            params![url, name, status.to_db_string(), now],
        )?;

        Ok(SiteRecord {
            id: self.conn.last_insert_rowid(),
            url: url.to_string(),
            name: name.to_string(),
            status,
            status_time: now,
            last_error: String::new(),
        })
    }

    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                "SELECT id, url, name, status, status_time, last_error FROM sites WHERE url = ?1",
                params![url],
                site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.conn
            .query_row(
                "SELECT id, url, name, status, status_time, last_error FROM sites WHERE id = ?1",
                params![site_id],
                site_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::SiteNotFound(format!("Site ID {}", site_id)))
    }

    fn list_sites(&self) -> StorageResult<Vec<SiteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, url, name, status, status_time, last_error FROM sites ORDER BY id",
        )?;
        let sites = stmt
            .query_map([], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn update_site_status(
        &mut self,
        site_id: i64,
        status: SiteStatus,
        last_error: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE sites SET status = ?1, last_error = ?2, status_time = ?3 WHERE id = ?4",
            params![status.to_db_string(), last_error, now, site_id],
        )?;
        Ok(())
    }

    fn touch_site(&mut self, site_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE sites SET status_time = ?1 WHERE id = ?2",
            params![now, site_id],
        )?;
        Ok(())
    }

    fn delete_site(&mut self, url: &str) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sites WHERE url = ?1", params![url])?;
        Ok(deleted > 0)
    }

    // ===== Page Management =====

    fn replace_page(
        &mut self,
        site_id: i64,
        path: &str,
        code: u16,
        content: &str,
    ) -> StorageResult<i64> {
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM pages WHERE site_id = ?1 AND path = ?2",
                params![site_id, path],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(old_id) = existing {
            remove_page(&tx, old_id)?;
        }

        tx.execute(
            "INSERT INTO pages (site_id, path, code, content) VALUES (?1, ?2, ?3, ?4)",
            params![site_id, path, code, content],
        )?;
        let page_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(page_id)
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                "SELECT id, site_id, path, code, content FROM pages WHERE id = ?1",
                params![page_id],
                page_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::PageNotFound(format!("Page ID {}", page_id)))
    }

    fn find_page(&self, site_id: i64, path: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                "SELECT id, site_id, path, code, content FROM pages WHERE site_id = ?1 AND path = ?2",
                params![site_id, path],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn page_exists(&self, site_id: i64, path: &str) -> StorageResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pages WHERE site_id = ?1 AND path = ?2)",
            params![site_id, path],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn delete_page(&mut self, site_id: i64, path: &str) -> StorageResult<bool> {
        let tx = self.conn.transaction()?;
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM pages WHERE site_id = ?1 AND path = ?2",
                params![site_id, path],
                |row| row.get(0),
            )
            .optional()?;

        let deleted = match existing {
            Some(page_id) => {
                remove_page(&tx, page_id)?;
                true
            }
            None => false,
        };
        tx.commit()?;

        Ok(deleted)
    }

    fn count_pages(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Lemmas and Postings =====

    fn index_lemmas(
        &mut self,
        site_id: i64,
        page_id: i64,
        counts: &HashMap<String, u32>,
    ) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;

        let page_site: Option<i64> = tx
            .query_row(
                "SELECT site_id FROM pages WHERE id = ?1",
                params![page_id],
                |row| row.get(0),
            )
            .optional()?;
        if page_site != Some(site_id) {
            return Err(StorageError::PageNotFound(format!(
                "Page ID {} in site {}",
                page_id, site_id
            )));
        }

        let mut entries: Vec<(&String, &u32)> = counts.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut written = 0;
        for (lemma, count) in entries {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
                    params![site_id, lemma],
                    |row| row.get(0),
                )
                .optional()?;

            let lemma_id = match existing {
                Some(id) => id,
                None => {
                    tx.execute(
                        "INSERT INTO lemmas (site_id, lemma, frequency) VALUES (?1, ?2, 0)",
                        params![site_id, lemma],
                    )?;
                    tx.last_insert_rowid()
                }
            };

            let has_posting: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM search_index WHERE page_id = ?1 AND lemma_id = ?2)",
                params![page_id, lemma_id],
                |row| row.get(0),
            )?;

            if has_posting {
                tx.execute(
                    "UPDATE search_index SET rank = ?3 WHERE page_id = ?1 AND lemma_id = ?2",
                    params![page_id, lemma_id, *count as f64],
                )?;
            } else {
                tx.execute(
                    "UPDATE lemmas SET frequency = frequency + 1 WHERE id = ?1",
                    params![lemma_id],
                )?;
                tx.execute(
                    "INSERT INTO search_index (page_id, lemma_id, rank) VALUES (?1, ?2, ?3)",
                    params![page_id, lemma_id, *count as f64],
                )?;
            }
            written += 1;
        }

        tx.commit()?;
        Ok(written)
    }

    fn find_lemma(&self, site_id: i64, lemma: &str) -> StorageResult<Option<LemmaRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, site_id, lemma, frequency FROM lemmas WHERE site_id = ?1 AND lemma = ?2",
                params![site_id, lemma],
                |row| {
                    Ok(LemmaRecord {
                        id: row.get(0)?,
                        site_id: row.get(1)?,
                        lemma: row.get(2)?,
                        frequency: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn postings_for_lemma(&self, lemma_id: i64) -> StorageResult<Vec<IndexRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT page_id, lemma_id, rank FROM search_index WHERE lemma_id = ?1")?;
        let postings = stmt
            .query_map(params![lemma_id], posting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(postings)
    }

    fn postings_for_page(&self, page_id: i64) -> StorageResult<Vec<IndexRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT page_id, lemma_id, rank FROM search_index WHERE page_id = ?1")?;
        let postings = stmt
            .query_map(params![page_id], posting_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(postings)
    }

    fn count_lemmas(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lemmas WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

/// Initializes or opens a database at the given path
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(Connection)` - Successfully opened/created database
/// * `Err(rusqlite::Error)` - Failed to open database
pub fn init_database(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    initialize_schema(&conn)?;

    Ok(conn)
}
