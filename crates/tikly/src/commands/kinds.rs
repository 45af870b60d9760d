//! `tikly kinds`

use tabled::Tabled;

use tikly_core::{EntitySchema, schema};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Path")]
    path: &'static str,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

impl From<&EntitySchema> for KindRow {
    fn from(s: &EntitySchema) -> Self {
        Self {
            kind: s.kind,
            path: s.path,
            mode: s.edit_mode.to_string(),
            fields: s.fields.iter().map(|f| f.name).collect::<Vec<_>>().join(", "),
        }
    }
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        global.output,
        schema::all(),
        |s| KindRow::from(*s),
        |s| s.kind.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
