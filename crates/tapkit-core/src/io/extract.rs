//! Archive extraction module
//!
//! Decodes tar.gz artifacts entirely in memory. Nothing touches the disk here,
//! so any error raised while walking the archive means the archive itself is
//! malformed.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::EntryType;

/// Permission bits applied when the archive records none of the execute bits.
pub const DEFAULT_EXEC_MODE: u32 = 0o755;

/// The tool's executable, pulled out of an archive.
#[derive(Debug, Clone)]
pub struct ExtractedExecutable {
    /// Path of the entry inside the archive.
    pub path_in_archive: PathBuf,
    /// Unix permission bits recorded for the entry.
    pub mode: u32,
    /// File contents.
    pub contents: Vec<u8>,
}

impl ExtractedExecutable {
    /// Whether the recorded mode has any execute bit set.
    pub fn is_executable(&self) -> bool {
        self.mode & 0o111 != 0
    }

    /// Mode to install with: the recorded permission bits, or
    /// [`DEFAULT_EXEC_MODE`] when the archive did not mark the file executable.
    /// Setuid, setgid and sticky bits are never carried over.
    pub fn install_mode(&self) -> u32 {
        if self.is_executable() {
            self.mode & 0o777
        } else {
            DEFAULT_EXEC_MODE
        }
    }
}

/// Result of walking an archive.
#[derive(Debug, Default)]
pub struct Scan {
    /// The matching executable, if the archive has one.
    pub executable: Option<ExtractedExecutable>,
    /// Number of entries seen, of any type.
    pub entries: usize,
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

/// Walk a tar.gz stream and pull out the regular file named `name`.
///
/// Archives commonly wrap their contents in a top-level directory
/// (`dashy-0.1.0/dashy`), so the match is on the last path component. When
/// several entries match, the shallowest wins. Every entry is read so that
/// truncation anywhere in the stream is reported.
pub fn scan_tar_gz(bytes: &[u8], name: &str) -> io::Result<Scan> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut scan = Scan::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        scan.entries += 1;

        let kind = entry.header().entry_type();
        if !matches!(kind, EntryType::Regular | EntryType::Continuous) {
            continue;
        }

        let path = entry.path()?.into_owned();
        if path.file_name().and_then(|n| n.to_str()) != Some(name) {
            // Drain so a truncated body surfaces as an error here.
            io::copy(&mut entry, &mut io::sink())?;
            continue;
        }

        let mut contents = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut contents)?;
        let mode = entry.header().mode()?;

        match &scan.executable {
            Some(found) if depth(&found.path_in_archive) <= depth(&path) => {
                tracing::warn!(
                    kept = %found.path_in_archive.display(),
                    ignored = %path.display(),
                    "archive contains more than one candidate executable"
                );
            }
            _ => {
                scan.executable = Some(ExtractedExecutable {
                    path_in_archive: path,
                    mode,
                    contents,
                });
            }
        }
    }

    Ok(scan)
}


#[cfg(test)]
mod tests {
    use super::testutil::tar_gz;
    use super::*;

    #[test]
    fn finds_top_level_executable() {
        let archive = tar_gz(&[
            ("README.md", 0o644, b"readme"),
            ("dashy", 0o755, b"#!/bin/sh\necho dashy\n"),
        ]);
        let scan = scan_tar_gz(&archive, "dashy").unwrap();
        let exe = scan.executable.unwrap();
        assert_eq!(scan.entries, 2);
        assert_eq!(exe.path_in_archive, PathBuf::from("dashy"));
        assert_eq!(exe.mode, 0o755);
        assert_eq!(exe.contents, b"#!/bin/sh\necho dashy\n");
    }

    #[test]
    fn prefers_shallowest_match() {
        let archive = tar_gz(&[
            ("dashy-0.1.0/docs/dashy", 0o644, b"man page"),
            ("dashy-0.1.0/dashy", 0o755, b"binary"),
        ]);
        let exe = scan_tar_gz(&archive, "dashy").unwrap().executable.unwrap();
        assert_eq!(exe.path_in_archive, PathBuf::from("dashy-0.1.0/dashy"));
        assert_eq!(exe.contents, b"binary");
    }

    #[test]
    fn missing_executable_is_none() {
        let archive = tar_gz(&[("other-tool", 0o755, b"nope")]);
        let scan = scan_tar_gz(&archive, "dashy").unwrap();
        assert!(scan.executable.is_none());
        assert_eq!(scan.entries, 1);
    }

    #[test]
    fn name_must_match_whole_component() {
        let archive = tar_gz(&[("dashy.sha256", 0o644, b"digest"), ("dashyd", 0o755, b"x")]);
        assert!(scan_tar_gz(&archive, "dashy").unwrap().executable.is_none());
    }

    #[test]
    fn rejects_non_gzip() {
        assert!(scan_tar_gz(b"definitely not an archive", "dashy").is_err());
    }

    #[test]
    fn rejects_gzip_without_tar_inside() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"hello world").unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(scan_tar_gz(&bytes, "dashy").is_err());
    }

    #[test]
    fn install_mode_adds_exec_bits_when_absent() {
        let exe = ExtractedExecutable {
            path_in_archive: PathBuf::from("dashy"),
            mode: 0o644,
            contents: Vec::new(),
        };
        assert!(!exe.is_executable());
        assert_eq!(exe.install_mode(), DEFAULT_EXEC_MODE);

        let exe = ExtractedExecutable { mode: 0o100_750, ..exe };
        assert_eq!(exe.install_mode(), 0o750);

        let exe = ExtractedExecutable { mode: 0o6755, ..exe };
        assert_eq!(exe.install_mode(), 0o755);
    }
}
