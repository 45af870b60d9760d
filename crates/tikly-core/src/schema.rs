//! Entity kinds as data.
//!
//! Every device object kind is one [`EntitySchema`]: its menu path, edit
//! mode, row-id field and typed fields. A single generic [`Entity`](crate::Entity)
//! engine interprets them; adding a kind means adding a static here.

use serde::Serialize;
use strum::Display;

use crate::store::EditMode;

/// Semantic type of a field, used to coerce its raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// Row identifier such as `*1A`.
    Id,
    Text,
    Integer,
    Boolean,
    /// Comma-separated set.
    List,
    Duration,
    DateTime,
}

/// One declared field of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    /// Set by the device; never written by clients.
    pub read_only: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            read_only: false,
        }
    }

    pub const fn read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }
}

/// Declaration of one device object kind.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct EntitySchema {
    /// Short name, e.g. `queue-simple`.
    pub kind: &'static str,
    /// Menu path, e.g. `/queue/simple`.
    pub path: &'static str,
    pub edit_mode: EditMode,
    /// Row identifier field; `None` for singleton menus.
    pub id_field: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_editable(&self) -> bool {
        self.edit_mode == EditMode::Editable
    }

    /// `<path>/<verb>`, e.g. `/ip/address/print`.
    pub fn command(&self, verb: &str) -> String {
        format!("{}/{verb}", self.path)
    }

    /// Names of the fields shown in tabular output: everything but the id.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(move |f| Some(f.name) != self.id_field)
            .map(|f| f.name)
    }
}

use FieldType::{Boolean, DateTime, Duration, Id, Integer, List, Text};

const fn f(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec::new(name, ty)
}

const fn ro(name: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec::new(name, ty).read_only()
}

// ── Built-in kinds ───────────────────────────────────────────────────

pub static LOG: EntitySchema = EntitySchema {
    kind: "log",
    path: "/log",
    edit_mode: EditMode::ReadOnly,
    id_field: Some(".id"),
    fields: &[
        ro(".id", Id),
        ro("time", DateTime),
        ro("topics", List),
        ro("message", Text),
    ],
};

pub static INTERFACE: EntitySchema = EntitySchema {
    kind: "interface",
    path: "/interface",
    edit_mode: EditMode::Editable,
    id_field: Some(".id"),
    fields: &[
        ro(".id", Id),
        f("name", Text),
        ro("type", Text),
        f("mtu", Integer),
        ro("actual-mtu", Integer),
        ro("mac-address", Text),
        ro("running", Boolean),
        f("disabled", Boolean),
        ro("link-downs", Integer),
        ro("last-link-up-time", DateTime),
        f("comment", Text),
    ],
};

pub static QUEUE_SIMPLE: EntitySchema = EntitySchema {
    kind: "queue-simple",
    path: "/queue/simple",
    edit_mode: EditMode::Editable,
    id_field: Some(".id"),
    fields: &[
        ro(".id", Id),
        f("name", Text),
        f("target", List),
        f("max-limit", Text),
        f("limit-at", Text),
        f("priority", Text),
        f("parent", Text),
        f("disabled", Boolean),
        ro("dynamic", Boolean),
        ro("invalid", Boolean),
        f("comment", Text),
    ],
};

pub static IP_ADDRESS: EntitySchema = EntitySchema {
    kind: "ip-address",
    path: "/ip/address",
    edit_mode: EditMode::Editable,
    id_field: Some(".id"),
    fields: &[
        ro(".id", Id),
        f("address", Text),
        f("network", Text),
        f("interface", Text),
        ro("actual-interface", Text),
        f("disabled", Boolean),
        ro("dynamic", Boolean),
        ro("invalid", Boolean),
        f("comment", Text),
    ],
};

pub static SYSTEM_RESOURCE: EntitySchema = EntitySchema {
    kind: "system-resource",
    path: "/system/resource",
    edit_mode: EditMode::ReadOnly,
    id_field: None,
    fields: &[
        ro("uptime", Duration),
        ro("version", Text),
        ro("build-time", DateTime),
        ro("free-memory", Integer),
        ro("total-memory", Integer),
        ro("cpu", Text),
        ro("cpu-count", Integer),
        ro("cpu-frequency", Integer),
        ro("cpu-load", Integer),
        ro("free-hdd-space", Integer),
        ro("total-hdd-space", Integer),
        ro("architecture-name", Text),
        ro("board-name", Text),
        ro("platform", Text),
    ],
};

pub static SYSTEM_IDENTITY: EntitySchema = EntitySchema {
    kind: "system-identity",
    path: "/system/identity",
    edit_mode: EditMode::Editable,
    id_field: None,
    fields: &[f("name", Text)],
};

static ALL: [&EntitySchema; 6] = [
    &LOG,
    &INTERFACE,
    &QUEUE_SIMPLE,
    &IP_ADDRESS,
    &SYSTEM_RESOURCE,
    &SYSTEM_IDENTITY,
];

/// Every built-in kind.
pub fn all() -> &'static [&'static EntitySchema] {
    &ALL
}

/// Find a built-in kind by its short name.
pub fn lookup(kind: &str) -> Option<&'static EntitySchema> {
    ALL.iter().copied().find(|s| s.kind == kind)
}
