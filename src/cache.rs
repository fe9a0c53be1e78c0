use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

/// SQLite-backed store for raw catalog-service responses, keyed by the
/// normalized (credential-redacted) request URL. Entries older than the
/// expiry window are treated as absent and swept on access.
pub struct ResponseCache {
    conn: Connection,
    expiry_days: u32,
}

impl ResponseCache {
    pub fn open(path: &Path, expiry_days: u32) -> rusqlite::Result<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                url        TEXT PRIMARY KEY,
                body       TEXT NOT NULL,
                fetched_on TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn, expiry_days })
    }

    /// In-memory cache for tests.
    #[cfg(test)]
    pub fn in_memory(expiry_days: u32) -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS responses (
                url        TEXT PRIMARY KEY,
                body       TEXT NOT NULL,
                fetched_on TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn, expiry_days })
    }

    fn oldest_usable(&self) -> NaiveDate {
        Utc::now().date_naive() - Duration::days(i64::from(self.expiry_days))
    }

    pub fn select(&self, url: &str) -> rusqlite::Result<Option<String>> {
        let cutoff = self.oldest_usable().to_string();
        self.conn.execute(
            "DELETE FROM responses WHERE fetched_on < ?1",
            params![cutoff],
        )?;
        let row = self
            .conn
            .query_row(
                "SELECT body FROM responses WHERE url = ?1 AND fetched_on >= ?2",
                params![url, cutoff],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        if row.is_some() {
            debug!("using cached response for {url}");
        }
        Ok(row)
    }

    pub fn insert(&self, url: &str, body: &str) -> rusqlite::Result<()> {
        let today = Utc::now().date_naive().to_string();
        self.conn.execute(
            "INSERT INTO responses (url, body, fetched_on) VALUES (?1, ?2, ?3)
             ON CONFLICT(url) DO UPDATE SET body = ?2, fetched_on = ?3",
            params![url, body, today],
        )?;
        Ok(())
    }

    pub fn delete(&self, url: &str) -> rusqlite::Result<()> {
        self.conn
            .execute("DELETE FROM responses WHERE url = ?1", params![url])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::ResponseCache;
    use rusqlite::params;

    #[test]
    fn insert_then_select_round_trips() {
        let cache = ResponseCache::in_memory(14).expect("open");
        cache.insert("https://example.test/a?x=1", "{}").expect("insert");
        let got = cache.select("https://example.test/a?x=1").expect("select");
        assert_eq!(got.as_deref(), Some("{}"));
    }

    #[test]
    fn select_misses_unknown_urls() {
        let cache = ResponseCache::in_memory(14).expect("open");
        let got = cache.select("https://example.test/missing").expect("select");
        assert!(got.is_none());
    }

    #[test]
    fn insert_overwrites_previous_body() {
        let cache = ResponseCache::in_memory(14).expect("open");
        cache.insert("u", "old").expect("insert");
        cache.insert("u", "new").expect("insert");
        assert_eq!(cache.select("u").expect("select").as_deref(), Some("new"));
    }

    #[test]
    fn expired_rows_are_invisible_and_swept() {
        let cache = ResponseCache::in_memory(14).expect("open");
        cache
            .conn
            .execute(
                "INSERT INTO responses (url, body, fetched_on) VALUES (?1, ?2, ?3)",
                params!["stale", "{}", "2001-01-01"],
            )
            .expect("seed");
        assert!(cache.select("stale").expect("select").is_none());
        let remaining: i64 = cache
            .conn
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))
            .expect("count");
        assert_eq!(remaining, 0);
    }

    #[test]
    fn delete_removes_entry() {
        let cache = ResponseCache::in_memory(14).expect("open");
        cache.insert("u", "{}").expect("insert");
        cache.delete("u").expect("delete");
        assert!(cache.select("u").expect("select").is_none());
    }
}
