//! Command dispatch: bridges CLI args -> sessions and entity lists -> output formatting.

pub mod config_cmd;
pub mod identity;
pub mod kinds;
pub mod print;
pub mod set;

use tikly_core::{EntitySchema, Session, schema};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Check arguments that can be judged before connecting.
pub fn validate(cmd: &Command) -> Result<(), CliError> {
    match cmd {
        Command::Print(args) => lookup_kind(&args.kind).map(|_| ()),
        Command::Set(args) => {
            lookup_kind(&args.kind)?;
            set::parse_assignments(&args.assignments).map(|_| ())
        }
        _ => Ok(()),
    }
}

/// Dispatch a device-bound command to the appropriate handler.
pub fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Print(args) => print::handle(session, &args, global),
        Command::Set(args) => set::handle(session, &args, global),
        Command::Identity => identity::handle(session, global),
        // Config, Kinds and Completions are handled before connecting
        Command::Config(_) | Command::Kinds | Command::Completions(_) => Ok(()),
    }
}

/// Resolve a kind name to its schema.
pub fn lookup_kind(kind: &str) -> Result<&'static EntitySchema, CliError> {
    schema::lookup(kind).ok_or_else(|| CliError::UnknownKind {
        kind: kind.into(),
        available: schema::all()
            .iter()
            .map(|s| s.kind)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
