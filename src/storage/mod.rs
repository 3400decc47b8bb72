use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// SQLite cache of page URL to display title.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS titles (
  url TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  updated_at INTEGER NOT NULL
);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    pub fn cache_title(&self, url: &str, title: &str, now_unix: i64) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO titles(url, title, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT(url) DO UPDATE SET title = excluded.title, updated_at = excluded.updated_at
"#,
                params![url, title, now_unix],
            )
            .context("cache title")?;
        Ok(())
    }

    pub fn get_title(&self, url: &str) -> anyhow::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT title FROM titles WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .optional()
            .context("get title")
    }
}

/// Clonable handle that opens the database per call on the blocking pool.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    path: PathBuf,
}

impl StorageHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn get_title(&self, url: &str) -> anyhow::Result<Option<String>> {
        let path = self.path.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || Storage::open(&path)?.get_title(&url))
            .await
            .context("join storage task")?
    }

    pub async fn cache_title(&self, url: &str, title: &str) -> anyhow::Result<()> {
        let path = self.path.clone();
        let url = url.to_string();
        let title = title.to_string();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        tokio::task::spawn_blocking(move || Storage::open(&path)?.cache_title(&url, &title, now))
            .await
            .context("join storage task")?
    }
}
