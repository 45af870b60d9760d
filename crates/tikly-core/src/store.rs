// ── Property store ──
//
// Raw field values for one row, exactly as the device sent them, plus the
// edit mode that decides whether they may be changed. Typed accessors
// coerce on read; nothing is parsed at load time.

use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use indexmap::{IndexMap, IndexSet};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use strum::Display;

use tikly_api::Row;

use crate::coerce;
use crate::error::CoreError;

/// Whether a row's fields may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, serde::Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EditMode {
    ReadOnly,
    Editable,
}

/// Field values of one configuration row.
///
/// Field names are case-sensitive. Fields the caller has no typed view of
/// are kept in arrival order and written back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyStore {
    kind: &'static str,
    mode: EditMode,
    fields: IndexMap<String, String>,
    dirty: IndexSet<String>,
}

impl PropertyStore {
    /// An empty store for an entity of `kind`.
    pub fn new(kind: &'static str, mode: EditMode) -> Self {
        Self {
            kind,
            mode,
            fields: IndexMap::new(),
            dirty: IndexSet::new(),
        }
    }

    /// A clean store holding one reply row.
    pub fn from_row(kind: &'static str, mode: EditMode, row: Row) -> Self {
        Self {
            fields: row,
            ..Self::new(kind, mode)
        }
    }

    /// Overwrite fields with values freshly read from the device. The
    /// merged fields are not marked dirty.
    pub fn merge_row(&mut self, row: Row) {
        for (name, value) in row {
            self.dirty.shift_remove(&name);
            self.fields.insert(name, value);
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editable(&self) -> bool {
        self.mode == EditMode::Editable
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All fields in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ── Typed reads ──────────────────────────────────────────────────

    /// The raw text of `name`, if present.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.raw(name)
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, CoreError> {
        self.coerce(name, "integer", |raw| raw.trim().parse().ok())
    }

    pub fn get_u64(&self, name: &str) -> Result<Option<u64>, CoreError> {
        self.coerce(name, "unsigned integer", |raw| raw.trim().parse().ok())
    }

    /// Accepts `true`/`false` and `yes`/`no`.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, CoreError> {
        self.coerce(name, "boolean", coerce::parse_bool)
    }

    /// A comma-separated set such as `topics`.
    pub fn get_list(&self, name: &str) -> Option<Vec<String>> {
        self.raw(name).map(coerce::parse_list)
    }

    pub fn get_duration(&self, name: &str) -> Result<Option<Duration>, CoreError> {
        self.coerce(name, "duration", coerce::parse_duration)
    }

    /// Timestamps without a year are placed in the current local year.
    pub fn get_datetime(&self, name: &str) -> Result<Option<NaiveDateTime>, CoreError> {
        self.get_datetime_relative(name, Local::now().date_naive())
    }

    /// Like [`get_datetime`](Self::get_datetime), with an explicit "today".
    pub fn get_datetime_relative(
        &self,
        name: &str,
        today: NaiveDate,
    ) -> Result<Option<NaiveDateTime>, CoreError> {
        self.coerce(name, "timestamp", |raw| coerce::parse_datetime(raw, today))
    }

    fn coerce<T>(
        &self,
        name: &str,
        expected: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Result<Option<T>, CoreError> {
        let Some(raw) = self.raw(name) else {
            return Ok(None);
        };
        parse(raw).map(Some).ok_or_else(|| CoreError::Coercion {
            field: name.to_owned(),
            value: raw.to_owned(),
            expected,
        })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Store `value` under `name` and mark it dirty.
    ///
    /// Fails with [`CoreError::ReadOnly`] on a read-only store, which is
    /// then left unchanged.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> Result<(), CoreError> {
        if self.mode == EditMode::ReadOnly {
            return Err(CoreError::ReadOnly {
                kind: self.kind.to_owned(),
            });
        }
        self.fields.insert(name.to_owned(), value.into());
        self.dirty.insert(name.to_owned());
        Ok(())
    }

    /// Record a value the device assigned (e.g. the id returned by `/add`).
    pub(crate) fn assign(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_owned(), value.into());
        self.dirty.shift_remove(name);
    }

    /// Fields written since the last [`mark_clean`](Self::mark_clean), in write order.
    pub fn dirty_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dirty
            .iter()
            .filter_map(|name| self.fields.get_key_value(name))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn mark_clean(&mut self) {
        self.dirty.clear();
    }
}

impl Serialize for PropertyStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn queue() -> PropertyStore {
        PropertyStore::from_row(
            "queue-simple",
            EditMode::Editable,
            row(&[(".id", "*1"), ("name", "guest"), ("disabled", "no"), ("priority", "8/8")]),
        )
    }

    #[test]
    fn missing_fields_are_none_for_every_accessor() {
        let store = queue();
        assert_eq!(store.get_str("absent"), None);
        assert_eq!(store.get_i64("absent").unwrap(), None);
        assert_eq!(store.get_u64("absent").unwrap(), None);
        assert_eq!(store.get_bool("absent").unwrap(), None);
        assert_eq!(store.get_list("absent"), None);
        assert_eq!(store.get_duration("absent").unwrap(), None);
        assert_eq!(store.get_datetime("absent").unwrap(), None);
    }

    #[test]
    fn uncoercible_value_is_an_error() {
        let err = queue().get_i64("name").unwrap_err();
        assert!(
            matches!(&err, CoreError::Coercion { field, value, expected: "integer" }
                if field == "name" && value == "guest"),
            "got {err:?}"
        );
        assert!(queue().get_bool("priority").is_err());
    }

    #[test]
    fn field_names_are_case_sensitive() {
        let store = queue();
        assert_eq!(store.get_str("name"), Some("guest"));
        assert_eq!(store.get_str("Name"), None);
    }

    #[test]
    fn read_only_store_rejects_writes_unchanged() {
        let mut store = PropertyStore::from_row("log", EditMode::ReadOnly, row(&[("message", "hi")]));
        let before = store.clone();
        let err = store.set_attribute("message", "x").unwrap_err();
        assert!(matches!(err, CoreError::ReadOnly { kind } if kind == "log"));
        assert_eq!(store, before);
    }

    #[test]
    fn writes_overwrite_and_track_dirty_fields() {
        let mut store = queue();
        store.set_attribute("priority", "1/1").unwrap();
        store.set_attribute("comment", "new").unwrap();

        assert_eq!(store.get_str("priority"), Some("1/1"));
        let dirty: Vec<_> = store.dirty_fields().collect();
        assert_eq!(dirty, vec![("priority", "1/1"), ("comment", "new")]);

        store.mark_clean();
        assert!(!store.is_dirty());
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn merge_keeps_unknown_fields_and_clears_dirty() {
        let mut store = queue();
        store.set_attribute("name", "edited").unwrap();
        store.merge_row(row(&[("name", "guest"), ("fw-7.15-field", "v")]));

        assert!(!store.is_dirty());
        let keys: Vec<_> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![".id", "name", "disabled", "priority", "fw-7.15-field"]);
    }

    #[test]
    fn serializes_as_flat_map_in_order() {
        let json = serde_json::to_string(&queue()).unwrap();
        assert_eq!(
            json,
            r#"{".id":"*1","name":"guest","disabled":"no","priority":"8/8"}"#
        );
    }
}
