//! Filesystem locations.

use dirs::home_dir;
use std::path::PathBuf;

/// Environment variable overriding the tapkit home directory.
pub const HOME_ENV: &str = "TAPKIT_HOME";

/// Returns the tapkit home directory, or None if the user's home cannot be resolved.
pub fn try_tapkit_home() -> Option<PathBuf> {
    if let Some(val) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".tapkit"))
}

/// Binary installation target: ~/.tapkit/bin
pub fn bin_path() -> Option<PathBuf> {
    try_tapkit_home().map(|h| h.join("bin"))
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_url_takes_last_segment() {
        assert_eq!(
            filename_from_url("https://example.com/v0.1.0/dashy-x86_64-apple-darwin.tar.gz"),
            "dashy-x86_64-apple-darwin.tar.gz"
        );
        assert_eq!(filename_from_url(""), "");
    }
}
