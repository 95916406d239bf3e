use std::collections::{HashMap, VecDeque};

use super::{
    Blob, Database, Error, Result,
    params::{self, Param, Rewritten},
};
use crate::value::{Object, Value};

/// Something that names a statement parameter: a 1-based index or a name
/// with its prefix (`:id`, `@id`, `$id`).
pub trait ParamIndex {
    /// Resolves to a 1-based parameter index.
    fn resolve(&self, names: &HashMap<String, usize>, count: usize) -> Result<usize>;
}

impl ParamIndex for usize {
    fn resolve(&self, _names: &HashMap<String, usize>, count: usize) -> Result<usize> {
        if *self == 0 || *self > count {
            return Err(Error::Bind {
                index: *self,
                reason: format!("statement has {count} parameters"),
            });
        }
        Ok(*self)
    }
}

impl ParamIndex for &str {
    fn resolve(&self, names: &HashMap<String, usize>, _count: usize) -> Result<usize> {
        names.get(*self).copied().ok_or_else(|| Error::Bind {
            index: 0,
            reason: format!("no parameter named {self}"),
        })
    }
}

/// A prepared statement.
///
/// Rows are produced by [`step`](Statement::step). The statement runs on
/// its first step; [`reset`](Statement::reset) lets it run again with the
/// current bindings.
#[derive(Debug)]
pub struct Statement {
    db: Database,
    sql: Rewritten,
    args: Vec<Param>,
    columns: Vec<String>,
    pending: Option<VecDeque<Vec<Value>>>,
    row: Vec<Value>,
    finished: bool,
}

impl Statement {
    pub(super) fn new(db: Database, sql: Rewritten, columns: Vec<String>) -> Self {
        let args = vec![Param::Null; sql.count];
        Self {
            db,
            sql,
            args,
            columns,
            pending: None,
            row: Vec::new(),
            finished: false,
        }
    }

    /// SQL as sent to SQLite, with parameters numbered.
    pub fn sql(&self) -> &str {
        &self.sql.sql
    }

    /// Number of parameters.
    pub fn parameter_count(&self) -> usize {
        self.sql.count
    }

    fn slot(&mut self, index: impl ParamIndex) -> Result<(usize, &mut Param)> {
        let index = index.resolve(&self.sql.names, self.sql.count)?;
        Ok((index, &mut self.args[index - 1]))
    }

    /// Binds a value. Booleans bind as 0 or 1; arrays and objects fail.
    pub fn bind(&mut self, index: impl ParamIndex, value: impl Into<Value>) -> Result<&mut Self> {
        let (index, slot) = self.slot(index)?;
        *slot = Param::from_value(&value.into(), index)?;
        Ok(self)
    }

    /// Binds a value by parameter name, prefix included.
    pub fn bind_named(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.bind(name, value)
    }

    pub fn bind_blob(&mut self, index: impl ParamIndex, blob: impl Into<Blob>) -> Result<&mut Self> {
        let (_, slot) = self.slot(index)?;
        *slot = Param::Blob(blob.into().0);
        Ok(self)
    }

    /// Sets every parameter back to NULL.
    pub fn clear_bindings(&mut self) {
        self.args.fill(Param::Null);
    }

    /// Advances to the next row. Returns false once the statement is done.
    pub async fn step(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(false);
        }

        if self.pending.is_none() {
            let rows = {
                let mut conn = self.db.conn().await?;
                trace!("step: {}", self.sql.sql);
                params::bind_all(sqlx::query(&self.sql.sql), &self.args)
                    .fetch_all(&mut *conn)
                    .await?
            };
            let mut pending = VecDeque::with_capacity(rows.len());
            for row in &rows {
                let values = params::decode_row(row)?;
                pending.push_back(values.into_iter().map(Param::into_value).collect());
            }
            self.pending = Some(pending);
        }

        match self.pending.as_mut().and_then(VecDeque::pop_front) {
            Some(row) => {
                self.row = row;
                Ok(true)
            }
            None => {
                self.row.clear();
                self.finished = true;
                Ok(false)
            }
        }
    }

    /// Rewinds the statement. Bindings are kept.
    pub fn reset(&mut self) {
        self.pending = None;
        self.row.clear();
        self.finished = false;
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Result column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    /// Column `index` of the current row.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.row.get(index)
    }

    /// The current row keyed by column name. Empty when there is no row.
    pub fn values(&self) -> Object {
        params::row_object(&self.columns, self.row.iter().cloned())
    }

    pub async fn changes(&self) -> Result<i64> {
        self.db.changes().await
    }

    pub async fn rowid(&self) -> Result<i64> {
        self.db.rowid().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::ResultCode;

    async fn table() -> Database {
        let db = Database::open(":memory:").await.unwrap();
        db.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, flag INTEGER, data BLOB)")
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let db = table().await;
        let mut insert = db
            .prepare("INSERT INTO items (name, flag) VALUES (?, ?)")
            .await
            .unwrap();
        assert_eq!(insert.parameter_count(), 2);
        for (name, flag) in [("a", true), ("b", false)] {
            insert.bind(1, name).unwrap().bind(2, flag).unwrap();
            assert!(!insert.step().await.unwrap());
            assert!(insert.finished());
            assert_eq!(insert.changes().await.unwrap(), 1);
            insert.reset();
        }
        assert_eq!(insert.rowid().await.unwrap(), 2);

        let mut select = db
            .prepare("SELECT id, name, flag FROM items ORDER BY id")
            .await
            .unwrap();
        assert_eq!(select.columns(), ["id", "name", "flag"]);
        assert_eq!(select.column(1), Some("name"));
        assert_eq!(select.column(3), None);

        assert!(select.step().await.unwrap());
        assert_eq!(select.value(0).unwrap(), &Value::from(1));
        assert_eq!(select.values()["flag"], 1);
        assert!(select.step().await.unwrap());
        assert_eq!(select.values()["name"], "b");
        assert_eq!(select.values()["flag"], 0);
        assert!(!select.step().await.unwrap());
        assert!(select.finished());
        assert!(!select.step().await.unwrap());
        assert!(select.values().is_empty());
    }

    #[tokio::test]
    async fn test_named_parameters() {
        let db = table().await;
        db.execute("INSERT INTO items (name, flag) VALUES ('x', 1), ('y', 2), ('z', 3)")
            .await
            .unwrap();

        let mut stmt = db
            .prepare("SELECT name FROM items WHERE flag >= :min AND flag <= @max ORDER BY flag")
            .await
            .unwrap();
        stmt.bind_named(":min", 2).unwrap();
        stmt.bind("@max", 3).unwrap();
        assert!(stmt.step().await.unwrap());
        assert_eq!(stmt.values()["name"], "y");

        stmt.reset();
        stmt.bind(1, 3).unwrap();
        assert!(stmt.step().await.unwrap());
        assert_eq!(stmt.values()["name"], "z");
        assert!(!stmt.step().await.unwrap());
    }

    #[tokio::test]
    async fn test_bind_errors() {
        let db = table().await;
        let mut stmt = db
            .prepare("SELECT * FROM items WHERE id = :id")
            .await
            .unwrap();

        let err = stmt.bind(2, 1).unwrap_err();
        assert_eq!(err.code(), ResultCode::Range);
        assert!(matches!(stmt.bind(0, 1), Err(Error::Bind { index: 0, .. })));
        assert!(matches!(stmt.bind(":nope", 1), Err(Error::Bind { .. })));
        assert!(matches!(
            stmt.bind(1, vec![1, 2]),
            Err(Error::Bind { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_unbound_is_null() {
        let db = table().await;
        let mut insert = db
            .prepare("INSERT INTO items (name, flag) VALUES (?1, ?2)")
            .await
            .unwrap();
        insert.bind(1, "only").unwrap();
        insert.step().await.unwrap();

        let mut select = db.prepare("SELECT flag FROM items").await.unwrap();
        assert!(select.step().await.unwrap());
        assert!(select.value(0).unwrap().is_null());
    }

    #[tokio::test]
    async fn test_blob_binding() {
        let db = table().await;
        let mut insert = db
            .prepare("INSERT INTO items (name, data) VALUES ($name, $data)")
            .await
            .unwrap();
        insert.bind("$name", "bytes").unwrap();
        insert.bind_blob("$data", b"raw".as_slice()).unwrap();
        insert.step().await.unwrap();

        let mut select = db
            .prepare("SELECT typeof(data) AS kind, data FROM items")
            .await
            .unwrap();
        assert!(select.step().await.unwrap());
        let row = select.values();
        assert_eq!(row["kind"], "blob");
        assert_eq!(row["data"], "raw");
    }

    #[tokio::test]
    async fn test_prepare_validates() {
        let db = table().await;
        assert!(db.prepare("SELECT * FROM nowhere").await.is_err());
        assert!(db.prepare("SELEKT 1").await.is_err());
    }
}
