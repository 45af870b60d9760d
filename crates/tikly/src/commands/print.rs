//! `tikly print <kind>`

use tikly_core::{EntityList, Session};

use crate::cli::{GlobalOpts, PrintArgs};
use crate::commands::lookup_kind;
use crate::error::CliError;
use crate::output;

pub fn handle(session: &Session, args: &PrintArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let schema = lookup_kind(&args.kind)?;
    let list = EntityList::with_session(schema, session);

    let rows = match &args.id {
        Some(id) => vec![list.find(id)?],
        None => list.load()?,
    };
    tracing::debug!(kind = schema.kind, rows = rows.len(), "printing rows");

    let out = output::render_entities(global.output, schema, &rows)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
