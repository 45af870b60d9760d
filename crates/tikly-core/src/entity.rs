// ── Generic entity ──
//
// One device row: a schema, the session it belongs to, and the property
// store holding its fields. Typed reads go through the schema; writes go
// through `PropertyStore::set_attribute` after the schema has vetted them.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use tikly_api::Row;

use crate::coerce;
use crate::error::CoreError;
use crate::schema::{EntitySchema, FieldSpec, FieldType};
use crate::session::Session;
use crate::store::{EditMode, PropertyStore};

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<String>),
    Duration(Duration),
    DateTime(NaiveDateTime),
}

impl Value {
    /// The text form the device accepts for this value.
    pub fn to_raw(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Boolean(b) => (if *b { "yes" } else { "no" }).to_owned(),
            Self::List(items) => items.join(","),
            Self::Duration(d) => coerce::format_duration(*d),
            Self::DateTime(dt) => dt.format("%b/%d/%Y %H:%M:%S").to_string().to_lowercase(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => f.write_str(&items.join(",")),
            Self::Duration(d) => f.write_str(&coerce::format_duration(*d)),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::List(items) => items.serialize(serializer),
            Self::Duration(_) | Self::DateTime(_) => serializer.collect_str(self),
        }
    }
}

/// One row of a device menu.
///
/// Two entities are equal when they have the same kind and row id, however
/// they were obtained. Rows of singleton menus (no id field) are equal by
/// kind alone; unsaved rows equal nothing.
#[derive(Clone)]
pub struct Entity {
    schema: &'static EntitySchema,
    session: Session,
    store: PropertyStore,
}

impl Entity {
    /// A blank row bound to the active session.
    pub fn new(schema: &'static EntitySchema) -> Result<Self, CoreError> {
        Ok(Self::with_session(schema, &Session::require_active()?))
    }

    /// A blank row bound to `session`.
    pub fn with_session(schema: &'static EntitySchema, session: &Session) -> Self {
        Self {
            schema,
            session: session.clone(),
            store: PropertyStore::new(schema.kind, schema.edit_mode),
        }
    }

    /// A row populated from device output, bound to `session`.
    pub fn from_row(schema: &'static EntitySchema, session: &Session, row: Row) -> Self {
        Self {
            schema,
            session: session.clone(),
            store: PropertyStore::from_row(schema.kind, schema.edit_mode, row),
        }
    }

    /// A row populated from device output, bound to the active session.
    pub fn from_active_row(schema: &'static EntitySchema, row: Row) -> Result<Self, CoreError> {
        Ok(Self::from_row(schema, &Session::require_active()?, row))
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn kind(&self) -> &'static str {
        self.schema.kind
    }

    pub fn edit_mode(&self) -> EditMode {
        self.schema.edit_mode
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    /// The device row id, once the row exists on the device.
    pub fn id(&self) -> Option<&str> {
        self.schema.id_field.and_then(|f| self.store.raw(f))
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The field coerced per its declared type. `Ok(None)` when absent.
    pub fn get(&self, field: &str) -> Result<Option<Value>, CoreError> {
        let spec = self.spec(field)?;
        let store = &self.store;
        Ok(match spec.ty {
            FieldType::Id | FieldType::Text => store.get_str(field).map(|s| Value::Text(s.to_owned())),
            FieldType::Integer => store.get_i64(field)?.map(Value::Integer),
            FieldType::Boolean => store.get_bool(field)?.map(Value::Boolean),
            FieldType::List => store.get_list(field).map(Value::List),
            FieldType::Duration => store.get_duration(field)?.map(Value::Duration),
            FieldType::DateTime => store.get_datetime(field)?.map(Value::DateTime),
        })
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.store.get_str(field)
    }

    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, CoreError> {
        self.store.get_i64(field)
    }

    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, CoreError> {
        self.store.get_bool(field)
    }

    pub fn get_list(&self, field: &str) -> Option<Vec<String>> {
        self.store.get_list(field)
    }

    pub fn get_duration(&self, field: &str) -> Result<Option<Duration>, CoreError> {
        self.store.get_duration(field)
    }

    pub fn get_datetime(&self, field: &str) -> Result<Option<NaiveDateTime>, CoreError> {
        self.store.get_datetime(field)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Write `field` from its text form.
    ///
    /// Rejected, leaving the row untouched, when the kind is read-only, the
    /// field is unknown or device-assigned, or `raw` does not parse as the
    /// field's type.
    pub fn set(&mut self, field: &str, raw: &str) -> Result<(), CoreError> {
        if self.schema.edit_mode == EditMode::ReadOnly {
            return Err(CoreError::ReadOnly {
                kind: self.kind().to_owned(),
            });
        }
        let spec = self.spec(field)?;
        if spec.read_only {
            return Err(CoreError::ReadOnlyField {
                kind: self.kind().to_owned(),
                field: field.to_owned(),
            });
        }
        validate(field, spec.ty, raw)?;
        self.store.set_attribute(field, raw)
    }

    /// Write a typed value.
    pub fn set_value(&mut self, field: &str, value: &Value) -> Result<(), CoreError> {
        self.set(field, &value.to_raw())
    }

    fn spec(&self, field: &str) -> Result<&'static FieldSpec, CoreError> {
        self.schema.field(field).ok_or_else(|| CoreError::UnknownField {
            kind: self.kind().to_owned(),
            field: field.to_owned(),
        })
    }
}

fn validate(field: &str, ty: FieldType, raw: &str) -> Result<(), CoreError> {
    let ok = match ty {
        FieldType::Id | FieldType::Text | FieldType::List => true,
        FieldType::Integer => raw.trim().parse::<i64>().is_ok(),
        FieldType::Boolean => coerce::parse_bool(raw).is_some(),
        FieldType::Duration => coerce::parse_duration(raw).is_some(),
        FieldType::DateTime => {
            coerce::parse_datetime(raw, chrono::Local::now().date_naive()).is_some()
        }
    };
    if ok {
        Ok(())
    } else {
        Err(CoreError::Coercion {
            field: field.to_owned(),
            value: raw.to_owned(),
            expected: match ty {
                FieldType::Integer => "integer",
                FieldType::Boolean => "boolean",
                FieldType::Duration => "duration",
                _ => "timestamp",
            },
        })
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match self.schema.id_field {
            None => true,
            Some(_) => self.id().is_some() && self.id() == other.id(),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.schema.kind)
            .field("session", &self.session.id())
            .field("fields", &self.store)
            .finish()
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Entity", 2)?;
        s.serialize_field("kind", self.schema.kind)?;
        s.serialize_field("fields", &self.store)?;
        s.end()
    }
}
