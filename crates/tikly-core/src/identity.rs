// Device identity snapshot, cached per session.

use std::time::Duration;

use serde::{Serialize, Serializer};

use tikly_api::Row;

use crate::coerce;
use crate::error::CoreError;
use crate::schema::SYSTEM_RESOURCE;
use crate::store::PropertyStore;

/// What the device says about itself: `/system/identity` plus the
/// interesting parts of `/system/resource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    pub name: Option<String>,
    pub board_name: Option<String>,
    pub version: Option<String>,
    pub architecture: Option<String>,
    pub cpu: Option<String>,
    pub cpu_count: Option<u64>,
    pub total_memory: Option<u64>,
    #[serde(serialize_with = "serialize_uptime")]
    pub uptime: Option<Duration>,
    /// The full resource row, including fields not broken out above.
    pub resource: Row,
}

impl DeviceIdentity {
    pub(crate) fn from_rows(
        identity: Option<&Row>,
        resource: Option<&Row>,
    ) -> Result<Self, CoreError> {
        let name = identity.and_then(|row| row.get("name").cloned());
        let resource = resource.cloned().unwrap_or_default();
        let store = PropertyStore::from_row(
            SYSTEM_RESOURCE.kind,
            SYSTEM_RESOURCE.edit_mode,
            resource.clone(),
        );
        let text = |field: &str| store.get_str(field).map(str::to_owned);

        Ok(Self {
            name,
            board_name: text("board-name"),
            version: text("version"),
            architecture: text("architecture-name"),
            cpu: text("cpu"),
            cpu_count: store.get_u64("cpu-count")?,
            total_memory: store.get_u64("total-memory")?,
            uptime: store.get_duration("uptime")?,
            resource,
        })
    }

    /// Label for prompts and log lines: the identity name, else the board.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.board_name.as_deref())
            .unwrap_or("unknown")
    }
}

#[allow(clippy::ref_option)]
fn serialize_uptime<S: Serializer>(uptime: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    match uptime {
        Some(d) => serializer.serialize_str(&coerce::format_duration(*d)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn builds_from_identity_and_resource_rows() {
        let identity = row(&[("name", "core-rtr")]);
        let resource = row(&[
            ("uptime", "2w1d03:04:05"),
            ("version", "7.15.2 (stable)"),
            ("cpu-count", "4"),
            ("total-memory", "1073741824"),
            ("board-name", "RB5009UG+S+"),
            ("bad-blocks", "0"),
        ]);

        let id = DeviceIdentity::from_rows(Some(&identity), Some(&resource)).unwrap();
        assert_eq!(id.display_name(), "core-rtr");
        assert_eq!(id.cpu_count, Some(4));
        assert_eq!(id.total_memory, Some(1_073_741_824));
        assert_eq!(id.uptime, Some(Duration::from_secs(15 * 86_400 + 11_045)));
        assert_eq!(id.resource.get("bad-blocks").unwrap(), "0");
    }

    #[test]
    fn missing_rows_give_empty_identity() {
        let id = DeviceIdentity::from_rows(None, None).unwrap();
        assert_eq!(id.name, None);
        assert_eq!(id.display_name(), "unknown");
    }

    #[test]
    fn malformed_resource_field_is_coercion_error() {
        let resource = row(&[("cpu-count", "four")]);
        let err = DeviceIdentity::from_rows(None, Some(&resource)).unwrap_err();
        assert!(matches!(err, CoreError::Coercion { .. }));
    }
}
