//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::{BuildCommand, Config, VERSION_PLACEHOLDER};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_project(config)?;
    validate_artifacts(config)?;
    validate_build(config)?;
    validate_git(config)?;
    validate_mirror(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_project(config: &Config) -> Result<()> {
    if config.project.name.is_empty() {
        return Err(invalid("project.name", "cannot be empty").into());
    }
    if config.launchpad.project.is_empty() {
        return Err(invalid("launchpad.project", "cannot be empty").into());
    }
    if config.announce.subreddit.is_empty() {
        return Err(invalid("announce.subreddit", "cannot be empty").into());
    }
    Ok(())
}

fn validate_artifacts(config: &Config) -> Result<()> {
    let versioned = [
        ("artifacts.core_library", &config.artifacts.core_library),
        ("artifacts.source_tarball", &config.artifacts.source_tarball),
        ("artifacts.archive", &config.artifacts.archive),
        ("artifacts.installer", &config.artifacts.installer),
    ];

    for (field, template) in versioned {
        if !template.contains(VERSION_PLACEHOLDER) {
            return Err(invalid(field, "must contain {version} placeholder").into());
        }
    }

    if config.artifacts.launcher.is_empty() {
        return Err(invalid("artifacts.launcher", "cannot be empty").into());
    }

    Ok(())
}

fn validate_build(config: &Config) -> Result<()> {
    check_commands("build.release", &config.build.release)?;
    check_commands("build.snapshot", &config.build.snapshot)
}

fn check_commands(field: &str, commands: &[BuildCommand]) -> Result<()> {
    for (i, command) in commands.iter().enumerate() {
        if command.program.trim().is_empty() {
            return Err(invalid(format!("{}[{}].program", field, i), "cannot be empty").into());
        }
    }
    Ok(())
}

fn validate_git(config: &Config) -> Result<()> {
    if config.git.remote.is_empty() {
        return Err(invalid("git.remote", "remote cannot be empty").into());
    }
    if config.git.branch.is_empty() {
        return Err(invalid("git.branch", "branch cannot be empty").into());
    }
    Ok(())
}

fn validate_mirror(config: &Config) -> Result<()> {
    if config.mirror.host.is_empty() {
        return Err(invalid("mirror.host", "cannot be empty").into());
    }
    if config.mirror.release_manifest == config.mirror.snapshot_manifest {
        return Err(invalid(
            "mirror.snapshot_manifest",
            "must differ from mirror.release_manifest",
        )
        .into());
    }
    Ok(())
}
