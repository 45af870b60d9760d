//! Flag-aware connection resolution on top of `tikly-config`.
//!
//! Precedence for every setting: command-line flag (or its `TIKLY_*` env
//! twin) > profile > `[defaults]`.

use tikly_config::{Config, ConnectParams, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Build connection parameters from the config file, profile, and flags.
pub fn resolve_connect_params(global: &GlobalOpts) -> Result<(String, ConnectParams), CliError> {
    let cfg = tikly_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let base = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly named profile must exist.
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        // No profile: flags alone must name the device.
        None if global.host.is_some() => Profile::default(),
        None => {
            return Err(CliError::NoConfig {
                path: tikly_config::config_path().display().to_string(),
            });
        }
    };

    let profile = apply_overrides(base, global);
    let params = tikly_config::profile_to_connect_params(&profile, &profile_name, &cfg.defaults)?;
    Ok((profile_name, params))
}

fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(host) = &global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = Some(port);
    }
    if let Some(user) = &global.user {
        profile.username = Some(user.clone());
    }
    if let Some(transport) = global.transport {
        profile.transport = transport;
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout.as_secs().max(1));
    }
    profile
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
