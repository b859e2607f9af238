mod schema;

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, ErrorCode, Row};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_LIMIT: u64 = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("clip with id {0:?} already exists")]
    DuplicateKey(String),
    #[error("sqlite error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database lock poisoned")]
    LockPoisoned,
}

/// A shared clipboard entry.
///
/// Every field decodes to an empty string when it is absent or `null`, so a
/// stored clip never carries a missing value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Clip {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub language: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub device_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub browser: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClipPage {
    pub clips: Vec<Clip>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_clips: u64,
}

/// Page coordinates for [`ClipStore::list_clips_paged`]. Both values are
/// 1-based positive integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a request from raw query values. Each value falls back to its
    /// default on its own when it is missing or not a positive integer.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total_clips: u64) -> u64 {
        total_clips.div_ceil(self.limit.max(1))
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
}

pub struct ClipStore {
    conn: Mutex<Connection>,
}

const CLIP_COLUMNS: &str = "
    id,
    text,
    language,
    name,
    device_type,
    browser
";

impl ClipStore {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    pub fn new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        conn.execute_batch(schema::CREATE_CLIPS_TABLE)?;
        Ok(())
    }

    pub fn insert_clip(&self, clip: &Clip) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            &format!("INSERT INTO clips ({CLIP_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
            params![
                clip.id,
                clip.text,
                clip.language,
                clip.name,
                clip.device_type,
                clip.browser,
            ],
        )
        .map_err(|err| match err {
            rusqlite::Error::SqliteFailure(ref failure, _)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                StoreError::DuplicateKey(clip.id.clone())
            }
            other => StoreError::Sql(other),
        })?;
        Ok(())
    }

    pub fn list_clips(&self) -> Result<Vec<Clip>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {CLIP_COLUMNS} FROM clips"))?;
        let rows = stmt.query_map([], clip_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    pub fn list_clips_paged(&self, request: PageRequest) -> Result<ClipPage, StoreError> {
        let limit = i64::try_from(request.limit.max(1)).unwrap_or(i64::MAX);
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let clips = {
            let mut stmt = tx.prepare(&format!(
                "
                SELECT {CLIP_COLUMNS}
                FROM clips
                LIMIT ?1 OFFSET ?2
                "
            ))?;
            let rows = stmt.query_map(params![limit, offset], clip_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        let total: i64 = tx.query_row("SELECT COUNT(*) FROM clips", [], |row| row.get(0))?;
        tx.commit()?;

        let total_clips = u64::try_from(total).unwrap_or_default();
        Ok(ClipPage {
            clips,
            current_page: request.page,
            total_pages: request.total_pages(total_clips),
            total_clips,
        })
    }

    pub fn clear_clips(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM clips", [])?;
        Ok(deleted)
    }
}

fn clip_from_row(row: &Row<'_>) -> Result<Clip, rusqlite::Error> {
    Ok(Clip {
        id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
        text: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        language: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        device_type: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        browser: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}
