//! Wheel resolution: derive a platform compatibility pattern from the
//! lockfile and pick the matching wheel out of a directory listing.
//!
//! Wheel names follow `{dist}-{version}-{cp}-{cp}-{platform}.whl`, where the
//! interpreter tag is `cp` plus the major and minor version components and
//! the platform tag embeds the sandbox kind, ABI version, and architecture
//! (e.g. `wasmbox_2024_0_wasm32`). Exactly one wheel in the candidate
//! directory is expected to match.

use std::path::Path;

use clap::ValueEnum;
use regex::Regex;
use tracing::warn;

use crate::error::LaunchError;
use crate::lockfile::RuntimeInfo;

/// Sandbox kind embedded in every wheel's platform tag.
const SANDBOX_KIND: &str = "wasmbox";

/// What to do when several wheels match the compatibility pattern
/// (e.g. stale builds from a prior version left in place).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MultipleMatchPolicy {
    /// Take the first wheel in directory-listing order; warn about the rest.
    First,
    /// Treat more than one matching wheel as an error.
    Fail,
}

/// Interpreter tag derived from the first two dotted version components:
/// `"3.11.0"` becomes `cp311`.
pub fn interpreter_tag(language_version: &str) -> Result<String, LaunchError> {
    let mut parts = language_version.split('.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor)) if !major.is_empty() && !minor.is_empty() => {
            Ok(format!("cp{major}{minor}"))
        }
        _ => Err(LaunchError::Config(format!(
            "language version {language_version:?} has no major.minor components"
        ))),
    }
}

/// Platform tag embedding sandbox kind, ABI version, and architecture.
pub fn platform_tag(info: &RuntimeInfo) -> String {
    format!("{SANDBOX_KIND}_{}_{}", info.abi_version, info.arch)
}

/// Compile the compatibility pattern for `distribution`.
///
/// Anchored to the full filename so a wheel name embedded in a longer name
/// never matches. The version fragment permits pre-release and build
/// suffixes but cannot cross a `-` separator.
pub fn wheel_pattern(distribution: &str, info: &RuntimeInfo) -> Result<Regex, LaunchError> {
    let cp = interpreter_tag(&info.language_version)?;
    let platform = regex::escape(&platform_tag(info));
    let pattern = format!(
        r"^{dist}-[\w\d.]+-{cp}-{cp}-{platform}\.whl$",
        dist = regex::escape(distribution),
    );
    Regex::new(&pattern)
        .map_err(|e| LaunchError::Config(format!("bad wheel pattern {pattern:?}: {e}")))
}

/// List the candidate wheel directory, preserving directory order.
pub fn list_wheel_dir(dir: &Path) -> Result<Vec<String>, LaunchError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| LaunchError::Resolution(format!("cannot list {}: {e}", dir.display())))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| LaunchError::Resolution(format!("cannot list {}: {e}", dir.display())))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

/// Filter `names` against the pattern, preserving their order.
pub fn matching_wheels(pattern: &Regex, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| pattern.is_match(name))
        .cloned()
        .collect()
}

/// Pick the wheel to install.
///
/// Zero matches is always an error; more than one match is resolved by
/// `policy`.
pub fn select_wheel(
    pattern: &Regex,
    names: &[String],
    policy: MultipleMatchPolicy,
) -> Result<String, LaunchError> {
    let mut candidates = matching_wheels(pattern, names);
    match candidates.len() {
        0 => Err(LaunchError::Resolution(format!(
            "no wheel matches {}",
            pattern.as_str()
        ))),
        1 => Ok(candidates.remove(0)),
        n => match policy {
            MultipleMatchPolicy::First => {
                warn!(
                    ignored = ?&candidates[1..],
                    "multiple wheels match, taking the first in directory order"
                );
                Ok(candidates.remove(0))
            }
            MultipleMatchPolicy::Fail => Err(LaunchError::Resolution(format!(
                "{n} wheels match {}: {candidates:?}",
                pattern.as_str()
            ))),
        },
    }
}
