//! Artifact download and verification.
//!
//! Streams the artifact into a private temporary directory while hashing it,
//! and only hands the bytes onward once the SHA256 matches. The temporary
//! directory is removed on every exit path.

use std::path::PathBuf;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;
use crate::paths::filename_from_url;
use tapkit_schema::{ArtifactDescriptor, Sha256Digest, ToolName, Version};

/// Transport-level failure. Safe for the caller to retry.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// No complete response within the configured bound.
    #[error("request to {url} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Requested URL.
        url: String,
        /// Bound that elapsed.
        timeout: Duration,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Connection refused, DNS failure, reset, TLS failure, ...
    #[error("failed to fetch {url}: {source}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
}

impl NetworkError {
    fn classify(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else if let Some(status) = err.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Errors from fetching and verifying an artifact.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport failure; see [`NetworkError`].
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The downloaded bytes do not hash to the declared checksum.
    #[error(
        "checksum mismatch for {url}: expected {expected}, got {actual} ({size} bytes received)"
    )]
    ChecksumMismatch {
        /// Requested URL.
        url: String,
        /// Declared digest.
        expected: String,
        /// Digest of what was received.
        actual: String,
        /// Number of bytes received.
        size: u64,
    },

    /// Local filesystem failure while staging the download.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Archive bytes whose SHA256 matched the expected checksum.
///
/// Only constructed after verification, so holding one is proof the bytes
/// passed the integrity check.
#[derive(Debug, Clone)]
pub struct VerifiedArtifact {
    url: String,
    bytes: Bytes,
    digest: Sha256Digest,
}

impl VerifiedArtifact {
    /// Hash `bytes` and accept them only if they match `expected`.
    pub fn verify(
        url: impl Into<String>,
        bytes: impl Into<Bytes>,
        expected: &Sha256Digest,
    ) -> Result<Self, FetchError> {
        let url = url.into();
        let bytes = bytes.into();
        let actual = hex::encode(Sha256::digest(&bytes));
        check_digest(&url, expected, &actual, bytes.len() as u64)?;
        Self::accept(url, bytes, &actual)
    }

    fn accept(url: String, bytes: Bytes, actual: &str) -> Result<Self, FetchError> {
        let digest = Sha256Digest::new(actual).map_err(std::io::Error::other)?;
        Ok(Self { url, bytes, digest })
    }

    /// Source URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Verified archive contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Digest the contents hashed to.
    pub fn digest(&self) -> &Sha256Digest {
        &self.digest
    }

    /// Size in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the artifact is zero bytes long.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn check_digest(
    url: &str,
    expected: &Sha256Digest,
    actual: &str,
    size: u64,
) -> Result<(), FetchError> {
    if expected.matches(actual) {
        Ok(())
    } else {
        Err(FetchError::ChecksumMismatch {
            url: url.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            size,
        })
    }
}

/// Downloads artifacts with a bounded timeout and verifies them.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    tmp_root: Option<PathBuf>,
}

impl Fetcher {
    /// Build a fetcher whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Transport {
                url: String::new(),
                source: e,
            })?;
        Ok(Self::with_client(client, timeout))
    }

    /// Use an existing client. `timeout` is only used for error reporting;
    /// the client's own bounds apply.
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            tmp_root: None,
        }
    }

    /// Stage downloads under `dir` instead of the system temp directory.
    pub fn with_tmp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_root = Some(dir.into());
        self
    }

    /// Download `desc.url` and verify it against `desc.expected_checksum`.
    pub async fn fetch<R: Reporter + ?Sized>(
        &self,
        desc: &ArtifactDescriptor,
        name: &ToolName,
        version: &Version,
        reporter: &R,
    ) -> Result<VerifiedArtifact, FetchError> {
        let url = desc.url.as_str();
        let net = |e: reqwest::Error| NetworkError::classify(url, self.timeout, e);

        let staging = match &self.tmp_root {
            Some(root) => {
                tokio::fs::create_dir_all(root).await?;
                tempfile::Builder::new().prefix("tapkit-").tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix("tapkit-").tempdir()?,
        };
        let file_name = match filename_from_url(url) {
            "" => "artifact",
            f => f,
        };
        let dest = staging.path().join(file_name);

        tracing::info!(%url, platform = %desc.platform, "downloading artifact");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(net)?;

        let total_size = response.content_length();
        reporter.downloading(name, version, 0, total_size);

        let mut file = File::create(&dest).await?;
        let mut stream = response.bytes_stream();
        let mut hasher = Sha256::new();
        let mut buffer = BytesMut::new();
        let mut downloaded: u64 = 0;

        // Hand on exactly the bytes that were hashed.
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(net)?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            buffer.extend_from_slice(&chunk);
            downloaded += chunk.len() as u64;
            reporter.downloading(name, version, downloaded, total_size);
        }

        file.flush().await?;
        drop(file);
        let actual_hash = hex::encode(hasher.finalize());
        tracing::debug!(bytes = downloaded, sha256 = %actual_hash, "download complete");

        check_digest(url, &desc.expected_checksum, &actual_hash, downloaded)?;

        VerifiedArtifact::accept(url.to_string(), buffer.freeze(), &actual_hash)
    }
}
