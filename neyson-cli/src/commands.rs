use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use neyson::{
    DocumentFormat, Json, Value, Xml,
    format::format_for_path,
    json,
    sqlite::{Database, OpenOptions},
    xml,
};

/// Output format of `convert`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Json,
    Toml,
}

fn reformat<F: DocumentFormat>(format: F, path: &Path, mode: F::Mode) -> Result<String> {
    let document = format
        .read_file(path)
        .with_context(|| format!("Failed to read {} as {}", path.display(), format.name()))?;
    Ok(format.write_string(&document, mode)?)
}

/// Reads a JSON or TOML file into a value.
fn read_value(path: &Path) -> Result<Value> {
    match format_for_path(path) {
        Some("json") => {
            json::fread(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        Some("toml") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
        }
        _ => bail!("unsupported input {}: expected .json or .toml", path.display()),
    }
}

pub fn fmt(path: &Path, compact: bool) -> Result<String> {
    match format_for_path(path) {
        Some("json") => {
            let mode = if compact {
                json::Mode::Compact
            } else {
                json::Mode::Readable
            };
            reformat(Json, path, mode)
        }
        Some("xml") => {
            let mode = if compact {
                xml::Mode::Compact
            } else {
                xml::Mode::Readable
            };
            reformat(Xml, path, mode)
        }
        _ => bail!("unsupported input {}: expected .json or .xml", path.display()),
    }
}

pub fn get(path: &Path, pointer: &str) -> Result<String> {
    let value = read_value(path)?;
    let found = value
        .pointer(pointer)
        .with_context(|| format!("Failed to resolve {pointer} in {}", path.display()))?;
    Ok(json::write(found, json::Mode::Readable)?)
}

pub fn convert(path: &Path, to: Target) -> Result<String> {
    let value = read_value(path)?;
    match to {
        Target::Json => Ok(json::write(&value, json::Mode::Readable)?),
        Target::Toml => {
            toml::to_string_pretty(&value).context("value cannot be represented as TOML")
        }
    }
}

/// Runs `sql` and renders the result rows as a JSON array.
pub async fn query(db: &Path, sql: &str) -> Result<String> {
    let path = db
        .to_str()
        .with_context(|| format!("database path {} is not valid UTF-8", db.display()))?;
    let db = Database::open_with(path, OpenOptions::new().create(false))
        .await
        .with_context(|| format!("Failed to open {path}"))?;

    let mut rows = Vec::new();
    let result = db
        .execute_with(sql, |row| {
            rows.push(Value::Object(row.clone()));
            true
        })
        .await;
    db.close().await?;
    result.context("query failed")?;

    Ok(json::write(&Value::Array(rows), json::Mode::Readable)?)
}
