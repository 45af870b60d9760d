//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use tikly_core::{Entity, EntitySchema};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Color only for an interactive stdout, and never with `NO_COLOR` set.
pub fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// A confirmation line, green on a terminal.
pub fn success(message: &str) -> String {
    if should_color() {
        format!("{} {message}", "✓".green())
    } else {
        format!("✓ {message}")
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false)?,
        OutputFormat::JsonCompact => render_json(data, true)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Render device rows of one kind.
///
/// Tables show the schema's columns (id first) with typed formatting;
/// JSON carries every raw field, including ones the schema does not name.
pub fn render_entities(
    format: OutputFormat,
    schema: &EntitySchema,
    rows: &[Entity],
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let columns: Vec<&str> = schema.id_field.into_iter().chain(schema.columns()).collect();
            let mut builder = Builder::default();
            builder.push_record(columns.iter().map(|c| (*c).to_owned()));
            for entity in rows {
                builder.push_record(columns.iter().map(|c| cell(entity, c)));
            }
            Ok(builder.build().with(Style::rounded()).to_string())
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            let stores: Vec<_> = rows.iter().map(Entity::store).collect();
            render_json(&stores, format == OutputFormat::JsonCompact)
        }
        OutputFormat::Plain => Ok(rows
            .iter()
            .map(|e| e.id().map_or_else(|| first_value(schema, e), str::to_owned))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Key/value detail table.
pub fn render_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut builder = Builder::default();
    for (key, value) in pairs {
        builder.push_record([key.to_owned(), value]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Typed display of one field; falls back to the raw text when it does
/// not coerce, and to empty when absent.
fn cell(entity: &Entity, column: &str) -> String {
    match entity.get(column) {
        Ok(Some(value)) => value.to_string(),
        Ok(None) => String::new(),
        Err(_) => entity.get_str(column).unwrap_or_default().to_owned(),
    }
}

fn first_value(schema: &EntitySchema, entity: &Entity) -> String {
    schema
        .columns()
        .find_map(|c| entity.get_str(c))
        .unwrap_or_default()
        .to_owned()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    })
}
