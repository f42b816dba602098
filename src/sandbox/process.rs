//! Process-backed sandbox implementation.
//!
//! Spawns the external sandbox runtime once and drives it over a stdio
//! pipe. The sandbox home directory is a host tempdir handed to the runtime
//! via environment variables; the runtime mounts it at [`HOME_MOUNT`]
//! inside the sandbox, so unpacking an archive into the tempdir populates
//! the sandbox's home.

use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tracing::{debug, instrument};

use super::{ArchiveFormat, Sandbox, HOME_MOUNT};
use crate::error::LaunchError;
use crate::transport::{RuntimePipe, RuntimeRequest, RuntimeResponse};

/// Env var carrying the host path of the sandbox home directory.
const HOME_DIR_VAR: &str = "WASMBOX_HOME_DIR";
/// Env var carrying the mount point inside the sandbox.
const HOME_MOUNT_VAR: &str = "WASMBOX_HOME_MOUNT";

/// Sandbox backed by a spawned runtime process.
pub struct ProcessSandbox {
    pipe: RuntimePipe,
    home: TempDir,
    request_timeout: Duration,
}

impl ProcessSandbox {
    /// Spawn the runtime executable and wait for it to come up.
    ///
    /// `request_timeout` bounds each install/run request; `ready_timeout`
    /// bounds interpreter boot.
    pub async fn spawn(
        exec: &str,
        request_timeout: Duration,
        ready_timeout: Duration,
    ) -> Result<Self, LaunchError> {
        let home = tempfile::tempdir()
            .map_err(|e| LaunchError::Sandbox(format!("cannot create sandbox home: {e}")))?;

        let env_vars = [
            (
                HOME_DIR_VAR.to_string(),
                home.path().to_string_lossy().into_owned(),
            ),
            (HOME_MOUNT_VAR.to_string(), HOME_MOUNT.to_string()),
        ];

        let pipe = RuntimePipe::spawn(exec, &env_vars, ready_timeout)
            .await
            .map_err(|e| LaunchError::Sandbox(format!("{e:#}")))?;

        Ok(Self {
            pipe,
            home,
            request_timeout,
        })
    }

    /// Host path of the directory mounted as the sandbox home.
    pub fn home_dir(&self) -> &Path {
        self.home.path()
    }

    /// Shut the runtime down. The home tempdir is removed on drop.
    pub async fn shutdown(self) -> Result<(), LaunchError> {
        self.pipe
            .shutdown()
            .await
            .map_err(|e| LaunchError::Sandbox(format!("{e:#}")))
    }

    async fn round_trip(&mut self, req: &RuntimeRequest) -> Result<(), LaunchError> {
        let resp = self
            .pipe
            .request(req, self.request_timeout)
            .await
            .map_err(|e| LaunchError::Sandbox(format!("{e:#}")))?;

        match resp {
            RuntimeResponse::Ok => Ok(()),
            RuntimeResponse::Error { message } => Err(LaunchError::Sandbox(message)),
            other => Err(LaunchError::Sandbox(format!(
                "unexpected runtime response: {other:?}"
            ))),
        }
    }
}

#[async_trait]
impl Sandbox for ProcessSandbox {
    #[instrument(skip(self))]
    async fn install(&mut self, packages: &[String]) -> Result<(), LaunchError> {
        debug!("Installing packages into sandbox");
        self.round_trip(&RuntimeRequest::Install {
            packages: packages.to_vec(),
        })
        .await
    }

    fn unpack_archive(&mut self, bytes: &[u8], format: ArchiveFormat) -> Result<(), LaunchError> {
        match format {
            ArchiveFormat::Zip => unpack_zip(bytes, self.home.path()),
        }
    }

    #[instrument(skip(self, source), fields(source_len = source.len()))]
    async fn run_source(&mut self, source: &str) -> Result<(), LaunchError> {
        debug!("Running source in sandbox");
        self.round_trip(&RuntimeRequest::RunSource {
            source: source.to_string(),
        })
        .await
    }
}

/// Extract a zip archive into `out_dir`, byte for byte.
///
/// Entries that would escape `out_dir` (absolute paths, `..`) make the whole
/// archive unusable.
fn unpack_zip(bytes: &[u8], out_dir: &Path) -> Result<(), LaunchError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| LaunchError::Archive(format!("cannot open snapshot zip: {e}")))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| LaunchError::Archive(format!("bad zip entry {i}: {e}")))?;
        let name = file.name().to_string();
        let rel = sanitize_rel_path(Path::new(&name))?;
        let out_path = out_dir.join(rel);

        if file.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| {
                LaunchError::Archive(format!("cannot create {}: {e}", out_path.display()))
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LaunchError::Archive(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let mut out = std::fs::File::create(&out_path).map_err(|e| {
            LaunchError::Archive(format!("cannot create {}: {e}", out_path.display()))
        })?;
        std::io::copy(&mut file, &mut out).map_err(|e| {
            LaunchError::Archive(format!("cannot write {}: {e}", out_path.display()))
        })?;
    }

    Ok(())
}

fn sanitize_rel_path(path: &Path) -> Result<PathBuf, LaunchError> {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::Prefix(_) | Component::RootDir => {
                return Err(LaunchError::Archive(format!(
                    "absolute path in archive: {}",
                    path.display()
                )))
            }
            Component::ParentDir => {
                return Err(LaunchError::Archive(format!(
                    "parent traversal in archive: {}",
                    path.display()
                )))
            }
            Component::CurDir => {}
            Component::Normal(p) => out.push(p),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            let options = SimpleFileOptions::default();
            for (name, body) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(body).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn unpack_zip_populates_home_tree() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = zip_with(&[
            ("lib/test/test_sample.py", b"def test_ok():\n    assert True\n"),
            ("lib/data.bin", &[0u8, 1, 2, 255]),
        ]);

        unpack_zip(&bytes, dir.path()).unwrap();

        let sample = std::fs::read(dir.path().join("lib/test/test_sample.py")).unwrap();
        assert_eq!(sample, b"def test_ok():\n    assert True\n");
        // Binary content survives byte for byte
        let data = std::fs::read(dir.path().join("lib/data.bin")).unwrap();
        assert_eq!(data, vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn corrupt_zip_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = unpack_zip(b"this is not a zip", dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::Archive(_)));
    }

    #[test]
    fn traversal_entry_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = zip_with(&[("../evil.txt", b"nope")]);

        let err = unpack_zip(&bytes, dir.path()).unwrap_err();
        assert!(matches!(err, LaunchError::Archive(_)));
        assert!(!dir.path().parent().unwrap().join("evil.txt").exists());
    }

    #[test]
    fn sanitize_strips_cur_dir_components() {
        let rel = sanitize_rel_path(Path::new("./lib/./test")).unwrap();
        assert_eq!(rel, PathBuf::from("lib/test"));
    }

    #[test]
    fn sanitize_rejects_absolute_paths() {
        assert!(sanitize_rel_path(Path::new("/etc/passwd")).is_err());
    }
}
