//! `tikly identity`

use tikly_core::{DeviceIdentity, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let identity = session.device_identity()?;
    let out = output::render_single(
        global.output,
        identity.as_ref(),
        detail,
        |id| id.display_name().to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn detail(id: &DeviceIdentity) -> String {
    let text = |v: Option<&str>| v.unwrap_or_default().to_owned();
    let num = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
    output::render_pairs([
        ("Name", text(id.name.as_deref())),
        ("Board", text(id.board_name.as_deref())),
        ("Version", text(id.version.as_deref())),
        ("Architecture", text(id.architecture.as_deref())),
        ("CPU", text(id.cpu.as_deref())),
        ("CPU count", num(id.cpu_count)),
        ("Memory", id.total_memory.map(format_bytes).unwrap_or_default()),
        (
            "Uptime",
            id.uptime
                .map(|d| humantime::format_duration(d).to_string())
                .unwrap_or_default(),
        ),
    ])
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    format!("{:.1} MiB", bytes as f64 / MIB)
}
