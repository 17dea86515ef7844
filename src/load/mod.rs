// src/load/mod.rs

use std::fs;
use std::path::{Path, PathBuf};

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlDatabaseError};
use sqlx::{ConnectOptions, Connection, Executor};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::DbSettings;
use crate::frame::{Cell, Frame};

// MySQL server error numbers that mean "bad credentials" rather than
// "server unreachable".
const ER_DBACCESS_DENIED: u16 = 1044;
const ER_ACCESS_DENIED: u16 = 1045;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot connect to MySQL at {host}:{port}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: sqlx::Error,
    },

    #[error("MySQL access denied for user '{user}'")]
    Auth {
        user: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("schema setup failed")]
    Schema(#[source] sqlx::Error),

    #[error("insert into `{table}` failed at row {row}")]
    Insert {
        table: String,
        row: usize,
        #[source]
        source: sqlx::Error,
    },
}

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    match err {
        sqlx::Error::Database(db) => db
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|e| e.number()),
        _ => None,
    }
}

/// Owns the single MySQL connection for a run. Acquired once at startup,
/// reused across every file, released through `close` on all exit paths.
pub struct Loader {
    conn: MySqlConnection,
    database: String,
}

impl Loader {
    /// Connect to the server without selecting a database, make sure the
    /// configured database exists, then select it. Failure here is fatal to
    /// the run: no database, no work possible.
    pub async fn connect(db: &DbSettings) -> Result<Self, LoadError> {
        let opts = MySqlConnectOptions::new()
            .host(&db.host)
            .port(db.port)
            .username(&db.user)
            .password(&db.password);

        let conn = opts.connect().await.map_err(|source| {
            match mysql_error_number(&source) {
                Some(ER_ACCESS_DENIED) | Some(ER_DBACCESS_DENIED) => LoadError::Auth {
                    user: db.user.clone(),
                    source,
                },
                _ => LoadError::Connection {
                    host: db.host.clone(),
                    port: db.port,
                    source,
                },
            }
        })?;
        info!(host = %db.host, port = db.port, "connected to MySQL server");

        let mut loader = Loader {
            conn,
            database: db.database.clone(),
        };
        // release the connection even when setup fails
        if let Err(e) = loader.select_database().await {
            loader.close().await;
            return Err(e);
        }
        Ok(loader)
    }

    async fn select_database(&mut self) -> Result<(), LoadError> {
        self.ensure_database().await?;
        self.conn
            .execute(format!("USE {}", quote_ident(&self.database)).as_str())
            .await
            .map_err(LoadError::Schema)?;
        debug!(database = %self.database, "database selected");
        Ok(())
    }

    /// Create the configured database if the server catalog does not list
    /// it. Idempotent; returns whether a create was issued.
    pub async fn ensure_database(&mut self) -> Result<bool, LoadError> {
        let row = sqlx::query("SHOW DATABASES LIKE ?")
            .bind(&self.database)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(LoadError::Schema)?;

        if row.is_some() {
            debug!(database = %self.database, "database already exists");
            return Ok(false);
        }

        self.conn
            .execute(format!("CREATE DATABASE {}", quote_ident(&self.database)).as_str())
            .await
            .map_err(LoadError::Schema)?;
        info!(database = %self.database, "created database");
        Ok(true)
    }

    /// Apply every `*.sql` file in `dir` (non-recursive, sorted by name),
    /// one transaction per file. A failing file is rolled back and logged,
    /// and the remaining files still run. Returns how many files applied
    /// cleanly.
    pub async fn apply_sql_dir(&mut self, dir: &Path) -> usize {
        let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| {
                    p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("sql"))
                })
                .collect(),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read schema directory");
                return 0;
            }
        };
        files.sort();

        let mut applied = 0usize;
        for file in files {
            match self.apply_sql_file(&file).await {
                Ok(statements) => {
                    info!(file = %file.display(), statements, "applied schema file");
                    applied += 1;
                }
                Err(e) => {
                    error!(file = %file.display(), error = %e, "schema file failed; rolled back");
                }
            }
        }
        applied
    }

    /// Run one SQL file inside a transaction; commit on success, roll back
    /// on the first failing statement.
    async fn apply_sql_file(&mut self, path: &Path) -> Result<usize, LoadError> {
        let text = fs::read_to_string(path)
            .map_err(|e| LoadError::Schema(sqlx::Error::Io(e)))?;
        let statements = split_statements(&text);
        if statements.is_empty() {
            return Ok(0);
        }

        let mut tx = self.conn.begin().await.map_err(LoadError::Schema)?;
        for stmt in &statements {
            if let Err(source) = (&mut *tx).execute(stmt.as_str()).await {
                tx.rollback().await.ok();
                return Err(LoadError::Schema(source));
            }
        }
        tx.commit().await.map_err(LoadError::Schema)?;
        Ok(statements.len())
    }

    /// Insert every row of `frame` into `table` with one parameterized
    /// statement executed per row, all inside a single transaction. Any row
    /// failure rolls the whole frame back. An empty frame is a no-op with
    /// no transaction at all.
    pub async fn insert_frame(&mut self, table: &str, frame: &Frame) -> Result<u64, LoadError> {
        if frame.is_empty() {
            debug!(table, "empty frame; nothing to insert");
            return Ok(0);
        }

        let sql = build_insert_sql(table, &frame.column_names());
        let insert_err = |row: usize, source: sqlx::Error| LoadError::Insert {
            table: table.to_string(),
            row,
            source,
        };

        let mut tx = self.conn.begin().await.map_err(|e| insert_err(0, e))?;
        for row in 0..frame.n_rows() {
            let mut query = sqlx::query(&sql);
            for cell in frame.row(row) {
                query = match cell {
                    Cell::Text(s) => query.bind(s.as_str()),
                    Cell::Int(v) => query.bind(*v),
                    Cell::Float(v) => query.bind(*v),
                    Cell::Null => query.bind(None::<&str>),
                };
            }
            if let Err(source) = query.execute(&mut *tx).await {
                tx.rollback().await.ok();
                return Err(insert_err(row, source));
            }
        }
        tx.commit()
            .await
            .map_err(|e| insert_err(frame.n_rows(), e))?;

        let inserted = frame.n_rows() as u64;
        info!(table, rows = inserted, "inserted frame");
        Ok(inserted)
    }

    /// Release the connection. Called on every exit path of a run.
    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, "error closing MySQL connection");
        }
    }
}

/// Backtick-quote an identifier, doubling any embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Build the per-row insert statement: the column list mirrors the frame's
/// columns in order, with one positional placeholder per column.
pub fn build_insert_sql(table: &str, columns: &[&str]) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        cols.join(", "),
        placeholders
    )
}

/// Split a schema file into statements on top-level semicolons. Quoted
/// strings and backticked identifiers are respected; blank statements are
/// dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == '\\' && q != '`' {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    current.push(c);
                }
                ';' => {
                    if !current.trim().is_empty() {
                        out.push(current.trim().to_string());
                    }
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}
