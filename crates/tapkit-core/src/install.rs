//! Placing the verified executable into the bin directory.
//!
//! The archive is decoded in memory, the executable is written to a temporary
//! file inside the target directory, and that file is renamed over
//! `<bin_dir>/<tool>`. Readers of the target path see either the old file or
//! the complete new one.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::io::download::VerifiedArtifact;
use crate::io::extract::{self, ExtractedExecutable};
use tapkit_schema::ToolName;

/// Errors from installing a verified artifact.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The checksum matched but the bytes are not a readable tar.gz.
    #[error(
        "archive {url} is not a valid tar.gz ({size} bytes, sha256 {digest} matched the formula, so the published artifact itself is malformed): {source}"
    )]
    ArchiveCorrupt {
        /// Artifact URL.
        url: String,
        /// Verified digest.
        digest: String,
        /// Archive size in bytes.
        size: u64,
        /// Decoder error.
        #[source]
        source: std::io::Error,
    },

    /// The archive is well formed but has no file with the tool's name.
    #[error("archive {url} does not contain an executable named '{name}' ({entries} entries)")]
    MissingExecutable {
        /// Artifact URL.
        url: String,
        /// Expected executable name.
        name: String,
        /// Entries the archive does contain.
        entries: usize,
    },

    /// Writing into the bin directory failed.
    #[error("failed to install into {}: {source}", path.display())]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl InstallError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Pull the executable named `name` out of a verified artifact.
pub fn extract(
    artifact: &VerifiedArtifact,
    name: &ToolName,
) -> Result<ExtractedExecutable, InstallError> {
    let scan = extract::scan_tar_gz(artifact.bytes(), name).map_err(|source| {
        InstallError::ArchiveCorrupt {
            url: artifact.url().to_string(),
            digest: artifact.digest().to_string(),
            size: artifact.len(),
            source,
        }
    })?;

    scan.executable.ok_or_else(|| InstallError::MissingExecutable {
        url: artifact.url().to_string(),
        name: name.to_string(),
        entries: scan.entries,
    })
}

/// Atomically place `exe` at `<bin_dir>/<name>`, replacing any existing file.
pub fn place(
    exe: ExtractedExecutable,
    name: &ToolName,
    bin_dir: &Path,
) -> Result<PathBuf, InstallError> {
    let target = bin_dir.join(name);
    std::fs::create_dir_all(bin_dir).map_err(InstallError::io(bin_dir))?;

    let mut staged = tempfile::Builder::new()
        .prefix(&format!(".{name}-"))
        .tempfile_in(bin_dir)
        .map_err(InstallError::io(bin_dir))?;
    staged
        .write_all(&exe.contents)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(InstallError::io(staged.path()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = exe.install_mode();
        if !exe.is_executable() {
            tracing::warn!(
                entry = %exe.path_in_archive.display(),
                "archive entry has no execute bits, installing with {mode:o}"
            );
        }
        std::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(mode))
            .map_err(InstallError::io(staged.path()))?;
    }

    staged
        .persist(&target)
        .map_err(|e| InstallError::io(&target)(e.error))?;

    tracing::info!(path = %target.display(), bytes = exe.contents.len(), "installed");
    Ok(target)
}

/// Extract and place in one step.
pub fn install(
    artifact: &VerifiedArtifact,
    name: &ToolName,
    bin_dir: &Path,
) -> Result<PathBuf, InstallError> {
    let exe = extract(artifact, name)?;
    place(exe, name, bin_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::extract::testutil::tar_gz;
    use sha2::{Digest, Sha256};
    use tapkit_schema::Sha256Digest;

    fn verified(bytes: Vec<u8>) -> VerifiedArtifact {
        let digest = Sha256Digest::new(hex::encode(Sha256::digest(&bytes))).unwrap();
        VerifiedArtifact::verify("https://example.com/dashy.tar.gz", bytes, &digest).unwrap()
    }

    #[test]
    fn installs_executable() {
        let bin = tempfile::tempdir().unwrap();
        let artifact = verified(tar_gz(&[("dashy-0.1.0/dashy", 0o755, b"#!/bin/sh\n")]));

        let path = install(&artifact, &ToolName::new("dashy"), bin.path()).unwrap();

        assert_eq!(path, bin.path().join("dashy"));
        assert_eq!(std::fs::read(&path).unwrap(), b"#!/bin/sh\n");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
        let leftovers: Vec<_> = std::fs::read_dir(bin.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "staging file must be renamed away");
    }

    #[cfg(unix)]
    #[test]
    fn drops_setuid_bit() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::tempdir().unwrap();
        let artifact = verified(tar_gz(&[("dashy", 0o4755, b"#!/bin/sh\n")]));

        let path = install(&artifact, &ToolName::new("dashy"), bin.path()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o755);
    }

    #[test]
    fn replaces_existing_file() {
        let bin = tempfile::tempdir().unwrap();
        std::fs::write(bin.path().join("dashy"), b"old").unwrap();
        let artifact = verified(tar_gz(&[("dashy", 0o755, b"new")]));

        install(&artifact, &ToolName::new("dashy"), bin.path()).unwrap();

        assert_eq!(std::fs::read(bin.path().join("dashy")).unwrap(), b"new");
    }

    #[test]
    fn missing_executable_leaves_target_untouched() {
        let bin = tempfile::tempdir().unwrap();
        std::fs::write(bin.path().join("dashy"), b"old").unwrap();
        std::fs::write(bin.path().join("other"), b"keep").unwrap();
        let artifact = verified(tar_gz(&[("README.md", 0o644, b"no binary here")]));

        let err = install(&artifact, &ToolName::new("dashy"), bin.path()).unwrap_err();

        assert!(matches!(
            err,
            InstallError::MissingExecutable { ref name, entries: 1, .. } if name == "dashy"
        ));
        let mut names: Vec<String> = std::fs::read_dir(bin.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["dashy", "other"]);
        assert_eq!(std::fs::read(bin.path().join("dashy")).unwrap(), b"old");
    }

    #[test]
    fn corrupt_archive_is_distinct_error() {
        let bin = tempfile::tempdir().unwrap();
        let artifact = verified(b"this is not gzip".to_vec());

        let err = install(&artifact, &ToolName::new("dashy"), bin.path()).unwrap_err();

        match err {
            InstallError::ArchiveCorrupt { digest, size, .. } => {
                assert_eq!(digest, artifact.digest().as_str());
                assert_eq!(size, 16);
            }
            other => panic!("expected corrupt archive, got {other:?}"),
        }
        assert!(std::fs::read_dir(bin.path()).unwrap().next().is_none());
    }
}
