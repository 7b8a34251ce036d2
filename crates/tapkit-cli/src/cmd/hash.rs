//! Hash command

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Print the SHA256 of each file, in `sha256sum` layout.
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let hash = compute_file_hash(file)
            .with_context(|| format!("failed to hash {}", file.display()))?;
        println!("{hash}  {}", file.display());
    }
    Ok(())
}

/// Compute SHA256 hash of a file (streaming)
fn compute_file_hash(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 65536]; // 64KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
