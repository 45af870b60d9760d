// ── Entity list ──
//
// Reads and writes the rows of one menu. All device traffic goes through
// the session's command capability; lists never hold a connector.

use tracing::debug;

use tikly_api::CommandConnector;

use crate::entity::Entity;
use crate::error::CoreError;
use crate::schema::EntitySchema;
use crate::session::Session;

/// The rows of one entity kind on one session.
#[derive(Debug, Clone)]
pub struct EntityList {
    schema: &'static EntitySchema,
    session: Session,
}

impl EntityList {
    /// A list bound to the active session.
    pub fn new(schema: &'static EntitySchema) -> Result<Self, CoreError> {
        Ok(Self::with_session(schema, &Session::require_active()?))
    }

    pub fn with_session(schema: &'static EntitySchema, session: &Session) -> Self {
        Self {
            schema,
            session: session.clone(),
        }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A blank row of this kind, to be filled in and passed to [`save`](Self::save).
    pub fn create(&self) -> Entity {
        Entity::with_session(self.schema, &self.session)
    }

    /// Every row, in device order.
    pub fn load(&self) -> Result<Vec<Entity>, CoreError> {
        let response = {
            let mut conn = self.session.cast_connector::<dyn CommandConnector>()?;
            conn.call(&self.schema.command("print"), &[])?
        };
        debug!(kind = self.schema.kind, rows = response.rows.len(), "loaded rows");
        Ok(response
            .rows
            .into_iter()
            .map(|row| Entity::from_row(self.schema, &self.session, row))
            .collect())
    }

    /// The row with id `id`.
    pub fn find(&self, id: &str) -> Result<Entity, CoreError> {
        self.load()?
            .into_iter()
            .find(|e| e.id() == Some(id))
            .ok_or_else(|| CoreError::NotFound {
                kind: self.schema.kind.to_owned(),
                id: id.to_owned(),
            })
    }

    /// Push `entity`'s pending edits to the device.
    ///
    /// A row with an id is updated with `set`; a row without one is created
    /// with `add` and takes the id the device returns. Singleton menus are
    /// always updated. Nothing is sent when there are no edits.
    pub fn save(&self, entity: &mut Entity) -> Result<(), CoreError> {
        self.check_writable(entity)?;
        if !entity.store().is_dirty() {
            return Ok(());
        }

        let mut args: Vec<(String, String)> = entity
            .store()
            .dirty_fields()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();

        let added = match (self.schema.id_field, entity.id()) {
            (Some(field), Some(id)) => {
                args.insert(0, (field.to_owned(), id.to_owned()));
                self.call("set", &args)?;
                None
            }
            (Some(field), None) => {
                let response = self.call("add", &args)?;
                response.ret().map(|id| (field, id.to_owned()))
            }
            (None, _) => {
                self.call("set", &args)?;
                None
            }
        };

        let store = entity.store_mut();
        if let Some((field, id)) = added {
            debug!(kind = self.schema.kind, %id, "row added");
            store.assign(field, id);
        }
        store.mark_clean();
        Ok(())
    }

    /// Delete `entity`'s row from the device.
    pub fn remove(&self, entity: &Entity) -> Result<(), CoreError> {
        self.check_writable(entity)?;
        let (Some(field), Some(id)) = (self.schema.id_field, entity.id()) else {
            return Err(CoreError::MissingId {
                kind: self.schema.kind.to_owned(),
            });
        };
        self.call("remove", &[(field.to_owned(), id.to_owned())])?;
        debug!(kind = self.schema.kind, id, "row removed");
        Ok(())
    }

    fn check_writable(&self, entity: &Entity) -> Result<(), CoreError> {
        if !self.schema.is_editable() {
            return Err(CoreError::ReadOnly {
                kind: self.schema.kind.to_owned(),
            });
        }
        if !std::ptr::eq(entity.schema(), self.schema) {
            return Err(CoreError::Config {
                message: format!(
                    "'{}' row passed to '{}' list",
                    entity.kind(),
                    self.schema.kind
                ),
            });
        }
        Ok(())
    }

    fn call(&self, verb: &str, args: &[(String, String)]) -> Result<tikly_api::Response, CoreError> {
        let args: Vec<(&str, &str)> = args.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let mut conn = self.session.cast_connector::<dyn CommandConnector>()?;
        Ok(conn.call(&self.schema.command(verb), &args)?)
    }
}
