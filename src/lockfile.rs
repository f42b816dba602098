//! Lockfile metadata describing the sandbox runtime's interpreter target.
//!
//! The build pipeline writes `wasmbox-lock.json` next to the wheels it
//! produces. Only the `info` block matters to the launcher: it pins the
//! interpreter version, ABI, and architecture the wheels were built against.
//! The lockfile is read once at startup and never written.

use std::path::Path;

use serde::Deserialize;

use crate::error::LaunchError;

/// Fixed lockfile name expected in the working directory.
pub const LOCKFILE_NAME: &str = "wasmbox-lock.json";

/// Top-level lockfile document.
#[derive(Debug, Clone, Deserialize)]
pub struct Lockfile {
    /// Interpreter target the wheels were built for.
    pub info: RuntimeInfo,
}

/// Interpreter target metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeInfo {
    /// Dotted interpreter version, e.g. `"3.11.0"`.
    pub language_version: String,

    /// ABI tag of the sandbox runtime, e.g. `"2024_0"`.
    pub abi_version: String,

    /// CPU architecture of the sandbox runtime, e.g. `"wasm32"`.
    pub arch: String,
}

impl Lockfile {
    /// Load and parse the lockfile at `path`.
    pub fn load(path: &Path) -> Result<Self, LaunchError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LaunchError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| LaunchError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_valid_lockfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);
        std::fs::write(
            &path,
            r#"{
                "info": {
                    "language_version": "3.11.0",
                    "abi_version": "2024_0",
                    "arch": "wasm32"
                }
            }"#,
        )
        .unwrap();

        let lockfile = Lockfile::load(&path).unwrap();
        assert_eq!(lockfile.info.language_version, "3.11.0");
        assert_eq!(lockfile.info.abi_version, "2024_0");
        assert_eq!(lockfile.info.arch, "wasm32");
    }

    #[test]
    fn missing_lockfile_is_config_error() {
        let err = Lockfile::load(Path::new("/nonexistent/wasmbox-lock.json")).unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
    }

    #[test]
    fn malformed_lockfile_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let err = Lockfile::load(&path).unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
    }

    #[test]
    fn lockfile_missing_info_field_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOCKFILE_NAME);
        std::fs::write(&path, r#"{"info": {"language_version": "3.11.0"}}"#).unwrap();

        let err = Lockfile::load(&path).unwrap_err();
        assert!(matches!(err, LaunchError::Config(_)));
    }
}
