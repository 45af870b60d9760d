//! `tikly set <kind> <id> field=value...`

use tikly_core::{EntityList, Session};

use crate::cli::{GlobalOpts, SetArgs};
use crate::commands::lookup_kind;
use crate::error::CliError;
use crate::output;

/// Id placeholder for menus that hold a single row.
const SINGLETON_ID: &str = "-";

pub fn handle(session: &Session, args: &SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let schema = lookup_kind(&args.kind)?;
    let assignments = parse_assignments(&args.assignments)?;
    let list = EntityList::with_session(schema, session);

    let mut entity = if schema.id_field.is_some() && args.id != SINGLETON_ID {
        list.find(&args.id)?
    } else {
        list.load()?
            .into_iter()
            .next()
            .ok_or_else(|| CliError::NotFound {
                kind: schema.kind.into(),
                id: args.id.clone(),
            })?
    };

    for (field, value) in &assignments {
        entity.set(field, value)?;
    }
    list.save(&mut entity)?;

    let target = entity.id().unwrap_or(schema.kind).to_owned();
    if !global.quiet {
        eprintln!("{}", output::success(&format!("Updated {} {target}", schema.kind)));
    }
    Ok(())
}

/// Split `field=value` arguments. Values may themselves contain `=`.
pub fn parse_assignments(raw: &[String]) -> Result<Vec<(&str, &str)>, CliError> {
    raw.iter()
        .map(|arg| match arg.split_once('=') {
            Some((field, value)) if !field.is_empty() => Ok((field, value)),
            _ => Err(CliError::Validation {
                field: arg.clone(),
                reason: "expected FIELD=VALUE".into(),
            }),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn assignments_split_on_first_equals() {
        let raw = vec!["comment=a=b".to_owned(), "disabled=yes".to_owned()];
        let parsed = parse_assignments(&raw).unwrap();
        assert_eq!(parsed, vec![("comment", "a=b"), ("disabled", "yes")]);
    }

    #[test]
    fn assignment_without_field_is_rejected() {
        for bad in ["=yes", "disabled"] {
            let err = parse_assignments(&[bad.to_owned()]).unwrap_err();
            assert!(matches!(err, CliError::Validation { .. }), "{bad}");
        }
    }
}
