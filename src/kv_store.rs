use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

/// A durable string key-value store, the only persistence the route store
/// needs. Values are opaque strings (JSON in practice).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default, Debug)]
pub struct MemoryKvStore {
    entries: HashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/* The on-disk store. It is deliberately dumb: a single `kv` table mapping a
string key to a string value, plus `db_metadata` for the schema version. Route
data lives under date keys (`YYYY-MM-DD`) as JSON arrays, settings live under
their own keys.
*/

pub const DB_FILE_NAME: &str = "routes.db";

fn init_metadata_and_get_version(tx: &Transaction) -> Result<i32> {
    let create_db_metadata_sql = "
    CREATE TABLE IF NOT EXISTS `db_metadata` (
	`key`	TEXT NOT NULL,
	`value`	TEXT,
	PRIMARY KEY(`key`)
    )";
    tx.execute(create_db_metadata_sql, ())?;
    let version_str: Option<String> = tx
        .query_row(
            "SELECT `value` FROM `db_metadata` WHERE key='version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match version_str {
        None => 0,
        Some(s) => s.parse()?,
    })
}

fn set_version_in_metadata(tx: &Transaction, version: i32) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO `db_metadata` (key, value) VALUES (?1, ?2)",
        ("version", version.to_string()),
    )?;
    Ok(())
}

#[allow(clippy::type_complexity)]
fn open_db_and_run_migration(
    dir: &Path,
    file_name: &str,
    migrations: &[&dyn Fn(&Transaction) -> Result<()>],
) -> Result<Connection> {
    debug!("open and run migration for {}", file_name);
    let mut conn = Connection::open(dir.join(file_name))?;
    let tx = conn.transaction()?;

    let version = init_metadata_and_get_version(&tx)? as usize;
    let target_version = migrations.len();
    debug!(
        "current version = {}, target_version = {}",
        version, target_version
    );
    match version.cmp(&target_version) {
        Ordering::Equal => (),
        Ordering::Less => {
            for (i, f) in migrations.iter().enumerate().skip(version) {
                info!("running migration for version: {}", i + 1);
                f(&tx)?;
            }
            set_version_in_metadata(&tx, target_version as i32)?;
        }
        Ordering::Greater => {
            bail!(
                "version too high: current version = {}, target_version = {}",
                version,
                target_version
            );
        }
    }
    tx.commit()?;
    Ok(conn)
}

pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<SqliteKvStore> {
        let conn = open_db_and_run_migration(
            dir.as_ref(),
            DB_FILE_NAME,
            &[&|tx| {
                let sql = "
                CREATE TABLE kv (
                    key               TEXT    PRIMARY KEY
                                              NOT NULL
                                              UNIQUE,
                    value             TEXT    NOT NULL
                );
                ";
                for s in sql_split::split(sql) {
                    tx.execute(&s, ())?;
                }
                Ok(())
            }],
        )?;
        Ok(SqliteKvStore { conn })
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .prepare_cached("SELECT value FROM kv WHERE key = ?1;")?
            .query_row((key,), |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .prepare_cached("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2);")?
            .execute((key, value))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .prepare_cached("DELETE FROM kv WHERE key = ?1;")?
            .execute((key,))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut query = self.conn.prepare("SELECT key FROM kv ORDER BY key;")?;
        let keys = query
            .query_map((), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    fn flush(&self) -> Result<()> {
        self.conn.cache_flush()?;
        Ok(())
    }
}
