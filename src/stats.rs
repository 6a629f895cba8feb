use chrono::{DateTime, Local};
use directories::ProjectDirs;
use rusqlite::{params, Connection, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One recorded login attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub matched: bool,
    pub points_entered: usize,
    pub points_saved: usize,
    /// Largest per-axis deviation; absent when the sequence lengths differed.
    pub max_deviation: Option<i64>,
    pub timestamp: DateTime<Local>,
}

/// Database manager for login attempt history
#[derive(Debug)]
pub struct AttemptDb {
    conn: Connection,
}

impl AttemptDb {
    /// Initialize the database connection and create tables if needed
    pub fn new() -> Result<Self> {
        let db_path = Self::get_db_path().unwrap_or_else(|| PathBuf::from("taplock_attempts.db"));
        Self::open(&db_path)
    }

    /// Open (or create) an attempt database at an explicit path.
    pub fn with_path<P: AsRef<Path>>(p: P) -> Result<Self> {
        Self::open(p.as_ref())
    }

    fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(db_path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS login_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                matched BOOLEAN NOT NULL,
                points_entered INTEGER NOT NULL,
                points_saved INTEGER NOT NULL,
                max_deviation INTEGER,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_login_attempts_timestamp ON login_attempts(timestamp)",
            [],
        )?;

        Ok(AttemptDb { conn })
    }

    /// Get the database file path under $HOME/.local/state/taplock
    fn get_db_path() -> Option<PathBuf> {
        // Try to use the XDG-compliant ~/.local/state directory first
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("taplock");
            Some(state_dir.join("attempts.db"))
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "taplock") {
            let state_dir = proj_dirs.data_local_dir();
            Some(state_dir.join("attempts.db"))
        } else {
            None
        }
    }

    /// Record a login attempt
    pub fn record_attempt(&self, rec: &AttemptRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO login_attempts
            (matched, points_entered, points_saved, max_deviation, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                rec.matched,
                rec.points_entered as i64,
                rec.points_saved as i64,
                rec.max_deviation,
                rec.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Most recent attempts, newest first
    pub fn recent_attempts(&self, limit: usize) -> Result<Vec<AttemptRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT matched, points_entered, points_saved, max_deviation, timestamp
            FROM login_attempts
            ORDER BY timestamp DESC
            LIMIT ?1
            "#,
        )?;

        let rec_iter = stmt.query_map([limit as i64], |row| {
            let timestamp_str: String = row.get(4)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        4,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(AttemptRecord {
                matched: row.get(0)?,
                points_entered: row.get::<_, i64>(1)? as usize,
                points_saved: row.get::<_, i64>(2)? as usize,
                max_deviation: row.get(3)?,
                timestamp,
            })
        })?;

        let mut records = Vec::new();
        for rec in rec_iter {
            records.push(rec?);
        }

        Ok(records)
    }

    /// Total number of recorded attempts
    pub fn attempt_count(&self) -> Result<i64> {
        let mut stmt = self.conn.prepare("SELECT COUNT(*) FROM login_attempts")?;
        stmt.query_row([], |row| row.get(0))
    }

    /// Percentage of attempts that matched, or None with no history
    pub fn success_rate(&self) -> Result<Option<f64>> {
        let mut stmt = self.conn.prepare(
            "SELECT AVG(CASE WHEN matched THEN 100.0 ELSE 0.0 END) FROM login_attempts",
        )?;

        let rate: Option<f64> = stmt.query_row([], |row| row.get(0))?;
        Ok(rate)
    }

    /// Average of the recorded max deviations (length mismatches excluded)
    pub fn avg_deviation(&self) -> Result<Option<f64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT AVG(max_deviation) FROM login_attempts WHERE max_deviation IS NOT NULL")?;

        let avg: Option<f64> = stmt.query_row([], |row| row.get(0))?;
        Ok(avg)
    }

    /// Write the full attempt history as CSV, newest first
    pub fn export_csv<W: Write>(&self, writer: W) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let records = self.recent_attempts(usize::MAX >> 1)?;

        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "timestamp",
            "matched",
            "points_entered",
            "points_saved",
            "max_deviation",
        ])?;

        for rec in records {
            wtr.write_record(&[
                rec.timestamp.to_rfc3339(),
                rec.matched.to_string(),
                rec.points_entered.to_string(),
                rec.points_saved.to_string(),
                rec.max_deviation
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}
