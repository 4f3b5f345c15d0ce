//! SQLite-backed persistence for the five pipeline record sets.
//!
//! The store owns no multi-table transactions; every operation is a
//! single-statement read or write. Concurrency safety rests entirely on
//! the UNIQUE constraints declared in the schema: external item id,
//! broadcast hour, and the broadcast/artifact pairing. A second writer
//! racing on any of these gets [`StoreError::Duplicate`], never a
//! silent overwrite.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{params, Connection, ErrorCode};
use thiserror::Error;

use crate::domain::{
    AudioArtifact, Broadcast, Category, NewBroadcast, NewRawItem, QualityScore, RawItem,
};

/// Errors from store reads and writes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write
    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS raw_items (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    author      TEXT NOT NULL,
    verified    INTEGER NOT NULL DEFAULT 0,
    content     TEXT NOT NULL,
    posted_at   INTEGER NOT NULL,
    engagement  INTEGER NOT NULL DEFAULT 0,
    ingested_at INTEGER NOT NULL,
    processed   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS quality_scores (
    item_id              INTEGER PRIMARY KEY,
    valid                INTEGER NOT NULL,
    confidence           REAL NOT NULL,
    primary_category     TEXT NOT NULL,
    secondary_categories TEXT NOT NULL,
    reasons              TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS broadcasts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    hour          INTEGER NOT NULL UNIQUE,
    script        TEXT NOT NULL,
    excerpt       TEXT NOT NULL,
    cluster_count INTEGER NOT NULL,
    item_count    INTEGER NOT NULL,
    word_count    INTEGER NOT NULL,
    duration_secs REAL NOT NULL,
    published     INTEGER NOT NULL DEFAULT 0,
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS audio_artifacts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    broadcast_id  INTEGER NOT NULL UNIQUE,
    url           TEXT NOT NULL,
    duration_secs REAL NOT NULL,
    size_bytes    INTEGER NOT NULL,
    voice         TEXT NOT NULL,
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS category_thresholds (
    category  TEXT PRIMARY KEY,
    threshold REAL NOT NULL
);
"#;

/// Counts for the status command.
#[derive(Debug, Clone, Default)]
pub struct StoreStatus {
    pub raw_items: i64,
    pub unprocessed_items: i64,
    pub quality_scores: i64,
    pub broadcasts: i64,
    pub unpublished_broadcasts: i64,
    pub audio_artifacts: i64,
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (and create if needed) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock still holds a usable connection
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ------------------------------------------------------------------
    // Raw items
    // ------------------------------------------------------------------

    /// Insert a fetched item. Returns the new row id, or `None` when an
    /// item with the same external id already exists (including a lost
    /// insert race, which the UNIQUE constraint reports).
    pub fn insert_raw_item(&self, item: &NewRawItem) -> Result<Option<i64>, StoreError> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO raw_items
               (external_id, author, verified, content, posted_at, engagement, ingested_at, processed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
            params![
                item.external_id,
                item.author,
                item.verified,
                item.content,
                item.posted_at.timestamp(),
                item.engagement,
                item.ingested_at.timestamp(),
            ],
        );

        match result {
            Ok(_) => Ok(Some(conn.last_insert_rowid())),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn raw_item_exists(&self, external_id: &str) -> Result<bool, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM raw_items WHERE external_id = ?1",
            params![external_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Unprocessed items ingested in the window `(hour - 1h, hour]`.
    pub fn unprocessed_items_for_hour(
        &self,
        hour: DateTime<Utc>,
    ) -> Result<Vec<RawItem>, StoreError> {
        let window_start = (hour - Duration::hours(1)).timestamp();
        let window_end = hour.timestamp();

        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, external_id, author, verified, content, posted_at, engagement,
                    ingested_at, processed
             FROM raw_items
             WHERE ingested_at > ?1 AND ingested_at <= ?2 AND processed = 0
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![window_start, window_end], row_to_raw_item)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Flip an item's processed flag to true. Never reverts.
    pub fn mark_item_processed(&self, item_id: i64) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE raw_items SET processed = 1 WHERE id = ?1",
            params![item_id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Quality scores
    // ------------------------------------------------------------------

    /// Persist a score. Scores are write-once; a second write for the
    /// same item is a [`StoreError::Duplicate`].
    pub fn insert_quality_score(&self, score: &QualityScore) -> Result<(), StoreError> {
        let secondary = serde_json::to_string(&score.secondary)?;
        let reasons = serde_json::to_string(&score.reasons)?;

        let result = self.conn().execute(
            "INSERT INTO quality_scores
               (item_id, valid, confidence, primary_category, secondary_categories, reasons)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                score.item_id,
                score.valid,
                score.confidence,
                score.primary.name(),
                secondary,
                reasons,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate("quality score")),
            Err(e) => Err(e.into()),
        }
    }

    pub fn quality_score(&self, item_id: i64) -> Result<Option<QualityScore>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT item_id, valid, confidence, primary_category, secondary_categories, reasons
             FROM quality_scores WHERE item_id = ?1",
        )?;

        let mut rows = stmt.query_map(params![item_id], row_to_quality_score)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Category thresholds
    // ------------------------------------------------------------------

    pub fn threshold_for(&self, category: Category) -> Result<Option<f64>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT threshold FROM category_thresholds WHERE category = ?1")?;
        let mut rows = stmt.query_map(params![category.name()], |row| row.get::<_, f64>(0))?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn set_threshold(&self, category: Category, threshold: f64) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT INTO category_thresholds (category, threshold) VALUES (?1, ?2)
             ON CONFLICT(category) DO UPDATE SET threshold = excluded.threshold",
            params![category.name(), threshold],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Broadcasts
    // ------------------------------------------------------------------

    /// Insert the hour's broadcast. The UNIQUE hour column is the sole
    /// guard against duplicate runs; a second writer for the same hour
    /// gets [`StoreError::Duplicate`].
    pub fn insert_broadcast(&self, broadcast: &NewBroadcast) -> Result<Broadcast, StoreError> {
        let created_at = Utc::now();
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO broadcasts
               (hour, script, excerpt, cluster_count, item_count, word_count, duration_secs,
                published, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
            params![
                broadcast.hour.timestamp(),
                broadcast.script,
                broadcast.excerpt,
                broadcast.cluster_count,
                broadcast.item_count,
                broadcast.word_count,
                broadcast.duration_secs,
                created_at.timestamp(),
            ],
        );

        match result {
            Ok(_) => Ok(Broadcast {
                id: conn.last_insert_rowid(),
                hour: broadcast.hour,
                script: broadcast.script.clone(),
                excerpt: broadcast.excerpt.clone(),
                cluster_count: broadcast.cluster_count,
                item_count: broadcast.item_count,
                word_count: broadcast.word_count,
                duration_secs: broadcast.duration_secs,
                published: false,
                created_at,
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate("broadcast hour")),
            Err(e) => Err(e.into()),
        }
    }

    /// Unpublished broadcasts, oldest hour first, at most `limit`.
    pub fn unpublished_broadcasts(&self, limit: usize) -> Result<Vec<Broadcast>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, hour, script, excerpt, cluster_count, item_count, word_count,
                    duration_secs, published, created_at
             FROM broadcasts
             WHERE published = 0
             ORDER BY hour ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], row_to_broadcast)?;
        let mut broadcasts = Vec::new();
        for row in rows {
            broadcasts.push(row?);
        }
        Ok(broadcasts)
    }

    pub fn broadcast(&self, id: i64) -> Result<Option<Broadcast>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, hour, script, excerpt, cluster_count, item_count, word_count,
                    duration_secs, published, created_at
             FROM broadcasts WHERE id = ?1",
        )?;

        let mut rows = stmt.query_map(params![id], row_to_broadcast)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn mark_broadcast_published(&self, id: i64) -> Result<(), StoreError> {
        self.conn().execute(
            "UPDATE broadcasts SET published = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Audio artifacts
    // ------------------------------------------------------------------

    /// Persist the audio artifact for a broadcast; at most one may
    /// exist per broadcast.
    pub fn insert_audio_artifact(
        &self,
        broadcast_id: i64,
        url: &str,
        duration_secs: f64,
        size_bytes: i64,
        voice: &str,
    ) -> Result<AudioArtifact, StoreError> {
        let created_at = Utc::now();
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO audio_artifacts
               (broadcast_id, url, duration_secs, size_bytes, voice, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                broadcast_id,
                url,
                duration_secs,
                size_bytes,
                voice,
                created_at.timestamp(),
            ],
        );

        match result {
            Ok(_) => Ok(AudioArtifact {
                id: conn.last_insert_rowid(),
                broadcast_id,
                url: url.to_string(),
                duration_secs,
                size_bytes,
                voice: voice.to_string(),
                created_at,
            }),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Duplicate("audio artifact")),
            Err(e) => Err(e.into()),
        }
    }

    pub fn audio_artifact(&self, broadcast_id: i64) -> Result<Option<AudioArtifact>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, broadcast_id, url, duration_secs, size_bytes, voice, created_at
             FROM audio_artifacts WHERE broadcast_id = ?1",
        )?;

        let mut rows = stmt.query_map(params![broadcast_id], row_to_audio_artifact)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------

    pub fn status(&self) -> Result<StoreStatus, StoreError> {
        let conn = self.conn();
        let count = |sql: &str| -> Result<i64, rusqlite::Error> {
            conn.query_row(sql, [], |row| row.get(0))
        };

        Ok(StoreStatus {
            raw_items: count("SELECT COUNT(*) FROM raw_items")?,
            unprocessed_items: count("SELECT COUNT(*) FROM raw_items WHERE processed = 0")?,
            quality_scores: count("SELECT COUNT(*) FROM quality_scores")?,
            broadcasts: count("SELECT COUNT(*) FROM broadcasts")?,
            unpublished_broadcasts: count("SELECT COUNT(*) FROM broadcasts WHERE published = 0")?,
            audio_artifacts: count("SELECT COUNT(*) FROM audio_artifacts")?,
        })
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

fn row_to_raw_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawItem> {
    Ok(RawItem {
        id: row.get(0)?,
        external_id: row.get(1)?,
        author: row.get(2)?,
        verified: row.get(3)?,
        content: row.get(4)?,
        posted_at: timestamp(row.get(5)?),
        engagement: row.get(6)?,
        ingested_at: timestamp(row.get(7)?),
        processed: row.get(8)?,
    })
}

fn row_to_quality_score(row: &rusqlite::Row<'_>) -> rusqlite::Result<QualityScore> {
    let primary: String = row.get(3)?;
    let secondary: String = row.get(4)?;
    let reasons: String = row.get(5)?;

    Ok(QualityScore {
        item_id: row.get(0)?,
        valid: row.get(1)?,
        confidence: row.get(2)?,
        primary: Category::parse(&primary),
        secondary: serde_json::from_str(&secondary).unwrap_or_default(),
        reasons: serde_json::from_str(&reasons).unwrap_or_default(),
    })
}

fn row_to_audio_artifact(row: &rusqlite::Row<'_>) -> rusqlite::Result<AudioArtifact> {
    Ok(AudioArtifact {
        id: row.get(0)?,
        broadcast_id: row.get(1)?,
        url: row.get(2)?,
        duration_secs: row.get(3)?,
        size_bytes: row.get(4)?,
        voice: row.get(5)?,
        created_at: timestamp(row.get(6)?),
    })
}

fn row_to_broadcast(row: &rusqlite::Row<'_>) -> rusqlite::Result<Broadcast> {
    Ok(Broadcast {
        id: row.get(0)?,
        hour: timestamp(row.get(1)?),
        script: row.get(2)?,
        excerpt: row.get(3)?,
        cluster_count: row.get(4)?,
        item_count: row.get(5)?,
        word_count: row.get(6)?,
        duration_secs: row.get(7)?,
        published: row.get(8)?,
        created_at: timestamp(row.get(9)?),
    })
}
