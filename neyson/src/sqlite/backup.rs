use std::collections::VecDeque;

use super::{
    Database, Error, Result,
    params::{self, Param},
};

/// A schema entry of the source database.
#[derive(Debug, Clone)]
struct SchemaItem {
    name: String,
    sql: String,
}

/// An incremental copy of one database into another.
///
/// The destination's tables and views are dropped on the first step. Each
/// step then recreates and fills some tables. Indexes, views and triggers
/// follow once every table is copied.
#[derive(Debug)]
pub struct Backup {
    source: Option<Database>,
    dest: Option<Database>,
    tables: VecDeque<SchemaItem>,
    extras: Vec<SchemaItem>,
    started: bool,
    finished: bool,
}

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

async fn schema(db: &Database, filter: &str) -> Result<Vec<(String, SchemaItem)>> {
    let sql = format!(
        "SELECT type, name, sql FROM sqlite_master \
         WHERE substr(name, 1, 7) != 'sqlite_' AND {filter} ORDER BY rowid"
    );
    let mut items = Vec::new();
    db.execute_with(&sql, |row| {
        let text = |key: &str| {
            row.get(key)
                .and_then(|v| v.as_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        items.push((
            text("type"),
            SchemaItem {
                name: text("name"),
                sql: text("sql"),
            },
        ));
        true
    })
    .await?;
    Ok(items)
}

impl Backup {
    pub(super) async fn new(source: Database, dest: Database) -> Result<Self> {
        let mut tables = VecDeque::new();
        let mut extras = Vec::new();
        for (kind, item) in schema(&source, "sql IS NOT NULL").await? {
            if kind == "table" {
                tables.push_back(item);
            } else {
                extras.push(item);
            }
        }
        debug!(
            "backup {} -> {}: {} tables, {} other objects",
            source.path(),
            dest.path(),
            tables.len(),
            extras.len()
        );
        Ok(Self {
            source: Some(source),
            dest: Some(dest),
            tables,
            extras,
            started: false,
            finished: false,
        })
    }

    fn databases(&self) -> Result<(&Database, &Database)> {
        match (&self.source, &self.dest) {
            (Some(source), Some(dest)) => Ok((source, dest)),
            _ => Err(Error::Closed),
        }
    }

    /// Copies up to `pages` tables, or everything when negative.
    ///
    /// Returns true while tables remain to be copied.
    pub async fn step(&mut self, pages: i32) -> Result<bool> {
        let (source, dest) = self
            .databases()
            .map(|(source, dest)| (source.clone(), dest.clone()))?;
        if self.finished {
            return Ok(false);
        }

        let foreign_keys: i64 = {
            let mut conn = dest.conn().await?;
            sqlx::query_scalar("PRAGMA foreign_keys")
                .fetch_one(&mut *conn)
                .await?
        };
        dest.execute("PRAGMA foreign_keys = OFF").await?;

        let result = self.copy(&source, &dest, pages).await;

        dest.execute(&format!("PRAGMA foreign_keys = {foreign_keys}"))
            .await?;
        result
    }

    async fn copy(&mut self, source: &Database, dest: &Database, pages: i32) -> Result<bool> {
        if !self.started {
            let existing = schema(dest, "type IN ('table', 'view')").await?;
            for (kind, item) in existing.iter().filter(|(kind, _)| kind == "view") {
                dest.execute(&format!("DROP VIEW IF EXISTS {}", quote(&item.name)))
                    .await?;
                trace!("backup dropped {kind} {}", item.name);
            }
            for (kind, item) in existing.iter().filter(|(kind, _)| kind == "table") {
                dest.execute(&format!("DROP TABLE IF EXISTS {}", quote(&item.name)))
                    .await?;
                trace!("backup dropped {kind} {}", item.name);
            }
            self.started = true;
        }

        let count = usize::try_from(pages).unwrap_or(usize::MAX);
        for _ in 0..count {
            let Some(table) = self.tables.pop_front() else {
                break;
            };
            copy_table(source, dest, &table).await?;
        }

        if !self.tables.is_empty() {
            return Ok(true);
        }

        for item in &self.extras {
            dest.execute(&item.sql).await?;
        }
        self.finished = true;
        debug!("backup {} -> {} finished", source.path(), dest.path());
        Ok(false)
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Releases both databases. Further steps fail with [`Error::Closed`].
    pub fn close(&mut self) {
        self.source = None;
        self.dest = None;
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some() && self.dest.is_some()
    }
}

async fn copy_table(source: &Database, dest: &Database, table: &SchemaItem) -> Result<()> {
    let rows = {
        let mut conn = source.conn().await?;
        let rows = sqlx::query(&format!("SELECT * FROM {}", quote(&table.name)))
            .fetch_all(&mut *conn)
            .await?;
        rows.iter()
            .map(params::decode_row)
            .collect::<Result<Vec<Vec<Param>>>>()?
    };

    dest.execute(&table.sql).await?;
    trace!("backup copying {} rows of {}", rows.len(), table.name);

    let Some(width) = rows.first().map(Vec::len) else {
        return Ok(());
    };
    let placeholders = (1..=width)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let insert = format!("INSERT INTO {} VALUES ({placeholders})", quote(&table.name));

    let mut conn = dest.conn().await?;
    sqlx::raw_sql("BEGIN").execute(&mut *conn).await?;
    for row in &rows {
        if let Err(e) = params::bind_all(sqlx::query(&insert), row)
            .execute(&mut *conn)
            .await
        {
            sqlx::raw_sql("ROLLBACK").execute(&mut *conn).await?;
            return Err(e.into());
        }
    }
    sqlx::raw_sql("COMMIT").execute(&mut *conn).await?;
    Ok(())
}
