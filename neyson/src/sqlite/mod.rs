//! Async SQLite access built on sqlx.
//!
//! A [`Database`] owns a single connection. Results come back as
//! [`Value`](crate::Value)s, and parameters are bound from them.
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> neyson::sqlite::Result<()> {
//! use neyson::sqlite::Database;
//!
//! let db = Database::open(":memory:").await?;
//! db.execute("CREATE TABLE t (id INTEGER, name TEXT); INSERT INTO t VALUES (1, 'one');")
//!     .await?;
//!
//! let mut stmt = db.prepare("SELECT name FROM t WHERE id = :id").await?;
//! stmt.bind(":id", 1)?;
//! assert!(stmt.step().await?);
//! assert_eq!(stmt.values()["name"], "one");
//! # Ok(())
//! # }
//! ```

use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::LevelFilter;
use sqlx::{
    ConnectOptions, Connection, Executor,
    sqlite::{SqliteConnectOptions, SqliteConnection},
};
use thiserror::Error;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::value::Object;

mod backup;
mod params;
mod statement;
mod transaction;

pub use backup::Backup;
pub use statement::{ParamIndex, Statement};
pub use transaction::Transaction;

/// SQLite primary result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Ok = 0,
    Error = 1,
    Internal = 2,
    Perm = 3,
    Abort = 4,
    Busy = 5,
    Locked = 6,
    NoMem = 7,
    ReadOnly = 8,
    Interrupt = 9,
    IoErr = 10,
    Corrupt = 11,
    NotFound = 12,
    Full = 13,
    CantOpen = 14,
    Protocol = 15,
    Empty = 16,
    Schema = 17,
    TooBig = 18,
    Constraint = 19,
    Mismatch = 20,
    Misuse = 21,
    NoLfs = 22,
    Auth = 23,
    Format = 24,
    Range = 25,
    NotADb = 26,
    Notice = 27,
    Warning = 28,
    Row = 100,
    Done = 101,
}

impl ResultCode {
    /// Maps a primary or extended result code to its primary code.
    pub fn from_code(code: i32) -> Self {
        match code & 0xFF {
            0 => ResultCode::Ok,
            2 => ResultCode::Internal,
            3 => ResultCode::Perm,
            4 => ResultCode::Abort,
            5 => ResultCode::Busy,
            6 => ResultCode::Locked,
            7 => ResultCode::NoMem,
            8 => ResultCode::ReadOnly,
            9 => ResultCode::Interrupt,
            10 => ResultCode::IoErr,
            11 => ResultCode::Corrupt,
            12 => ResultCode::NotFound,
            13 => ResultCode::Full,
            14 => ResultCode::CantOpen,
            15 => ResultCode::Protocol,
            16 => ResultCode::Empty,
            17 => ResultCode::Schema,
            18 => ResultCode::TooBig,
            19 => ResultCode::Constraint,
            20 => ResultCode::Mismatch,
            21 => ResultCode::Misuse,
            22 => ResultCode::NoLfs,
            23 => ResultCode::Auth,
            24 => ResultCode::Format,
            25 => ResultCode::Range,
            26 => ResultCode::NotADb,
            27 => ResultCode::Notice,
            28 => ResultCode::Warning,
            100 => ResultCode::Row,
            101 => ResultCode::Done,
            _ => ResultCode::Error,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Errors raised by the SQLite front-end.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine rejected an operation.
    #[error("sqlite error {code}: {message}")]
    Sqlite {
        code: ResultCode,
        /// Extended result code as reported by SQLite.
        extended: i32,
        message: String,
    },

    /// The database was closed.
    #[error("database is closed")]
    Closed,

    /// A parameter could not be bound.
    #[error("cannot bind parameter {index}: {reason}")]
    Bind { index: usize, reason: String },

    /// Any other driver failure.
    #[error(transparent)]
    Driver(sqlx::Error),
}

impl Error {
    /// Primary result code best describing the error.
    pub fn code(&self) -> ResultCode {
        match self {
            Error::Sqlite { code, .. } => *code,
            Error::Closed => ResultCode::Misuse,
            Error::Bind { .. } => ResultCode::Range,
            Error::Driver(_) => ResultCode::Error,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(extended) = db.code().and_then(|code| code.parse::<i32>().ok()) {
                return Error::Sqlite {
                    code: ResultCode::from_code(extended),
                    extended,
                    message: db.message().to_string(),
                };
            }
        }
        Error::Driver(err)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Raw bytes bound with BLOB affinity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob(pub Vec<u8>);

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

impl From<&[u8]> for Blob {
    fn from(bytes: &[u8]) -> Self {
        Blob(bytes.to_vec())
    }
}

/// How a database file is opened.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    read_only: bool,
    create: bool,
    shared_cache: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            create: true,
            shared_cache: false,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens without write access. Implies no creation.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Creates the file if it does not exist.
    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn shared_cache(mut self, shared_cache: bool) -> Self {
        self.shared_cache = shared_cache;
        self
    }

    fn connect_options(&self, path: &str) -> Result<SqliteConnectOptions> {
        let options = if path.is_empty() || path == ":memory:" {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new().filename(path)
        };
        Ok(options
            .read_only(self.read_only)
            .create_if_missing(self.create && !self.read_only)
            .shared_cache(self.shared_cache)
            .log_statements(LevelFilter::Trace))
    }
}

/// A connection to an SQLite database.
///
/// Clones share the same connection; operations are serialized.
#[derive(Debug, Clone)]
pub struct Database {
    conn: Arc<Mutex<Option<SqliteConnection>>>,
    /// Set when a [`Transaction`] is dropped without commit or rollback.
    rollback: Arc<AtomicBool>,
    path: Arc<str>,
}

impl Database {
    /// Opens `path` for reading and writing, creating it if needed.
    ///
    /// `:memory:` opens a private in-memory database.
    pub async fn open(path: &str) -> Result<Self> {
        Self::open_with(path, OpenOptions::default()).await
    }

    pub async fn open_with(path: &str, options: OpenOptions) -> Result<Self> {
        debug!("opening sqlite database {path} ({options:?})");
        let conn = options.connect_options(path)?.connect().await?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            rollback: Arc::new(AtomicBool::new(false)),
            path: path.into(),
        })
    }

    /// Path the database was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Closes the connection for every clone. Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        if let Some(conn) = self.conn.lock().await.take() {
            debug!("closing sqlite database {}", self.path);
            conn.close().await?;
        }
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    fn same_connection(&self, other: &Database) -> bool {
        Arc::ptr_eq(&self.conn, &other.conn)
    }

    pub(crate) fn schedule_rollback(&self) {
        self.rollback.store(true, Ordering::Release);
    }

    /// Locks the connection, first rolling back any abandoned transaction.
    pub(crate) async fn conn(&self) -> Result<MappedMutexGuard<'_, SqliteConnection>> {
        let guard = self.conn.lock().await;
        let mut conn = MutexGuard::try_map(guard, Option::as_mut).map_err(|_| Error::Closed)?;
        if self.rollback.swap(false, Ordering::AcqRel) {
            warn!("rolling back abandoned transaction on {}", self.path);
            if let Err(e) = sqlx::raw_sql("ROLLBACK").execute(&mut *conn).await {
                warn!("rollback failed: {e}");
            }
        }
        Ok(conn)
    }

    /// Runs one or more `;`-separated statements.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        trace!("execute: {sql}");
        sqlx::raw_sql(sql).execute(&mut *conn).await?;
        Ok(())
    }

    /// Runs `sql` and calls `step` with every result row.
    ///
    /// Each row maps column names to values. Returning `false` from `step`
    /// stops early without error.
    pub async fn execute_with<F>(&self, sql: &str, mut step: F) -> Result<()>
    where
        F: FnMut(&Object) -> bool,
    {
        let rows = {
            let mut conn = self.conn().await?;
            trace!("execute: {sql}");
            sqlx::raw_sql(sql).fetch_all(&mut *conn).await?
        };

        for row in &rows {
            let columns = params::column_names(row);
            let values = params::decode_row(row)?.into_iter().map(params::Param::into_value);
            if !step(&params::row_object(&columns, values)) {
                debug!("row callback stopped early");
                break;
            }
        }
        Ok(())
    }

    /// Rows modified by the most recent INSERT, UPDATE or DELETE.
    pub async fn changes(&self) -> Result<i64> {
        let mut conn = self.conn().await?;
        Ok(sqlx::query_scalar("SELECT changes()")
            .fetch_one(&mut *conn)
            .await?)
    }

    /// Rowid of the most recent successful INSERT.
    pub async fn rowid(&self) -> Result<i64> {
        let mut conn = self.conn().await?;
        Ok(sqlx::query_scalar("SELECT last_insert_rowid()")
            .fetch_one(&mut *conn)
            .await?)
    }

    /// Compiles `sql` into a reusable statement.
    ///
    /// The SQL is checked right away, so syntax errors and unknown tables
    /// are reported here rather than on the first step.
    pub async fn prepare(&self, sql: &str) -> Result<Statement> {
        let rewritten = params::rewrite(sql);
        let columns = {
            let mut conn = self.conn().await?;
            trace!("prepare: {}", rewritten.sql);
            let prepared = (&mut *conn).prepare(&rewritten.sql).await?;
            sqlx::Statement::columns(&prepared)
                .iter()
                .map(|c| sqlx::Column::name(c).to_string())
                .collect()
        };
        Ok(Statement::new(self.clone(), rewritten, columns))
    }

    /// Starts a deferred transaction.
    pub async fn transaction(&self) -> Result<Transaction> {
        self.execute("BEGIN TRANSACTION").await?;
        debug!("transaction started on {}", self.path);
        Ok(Transaction::new(self.clone()))
    }

    /// Prepares a copy of `source` into this database.
    ///
    /// Nothing is copied until [`Backup::step`] is called.
    pub async fn backup(&self, source: &Database) -> Result<Backup> {
        if self.same_connection(source) {
            return Err(Error::Sqlite {
                code: ResultCode::Error,
                extended: ResultCode::Error as i32,
                message: "source and destination must be distinct".into(),
            });
        }
        Backup::new(source.clone(), self.clone()).await
    }
}
