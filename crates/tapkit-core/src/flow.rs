//! Install Flow Typestate Pattern
//!
//! Models the install-then-test run as a series of explicit state transitions:
//!
//! ```text
//! Detected --[resolve()]--> Resolved --[fetch()]--> Fetched --[install()]--> Installed --[smoke_test()]--> Tested
//! ```
//!
//! Each transition consumes the previous state, so an archive cannot be
//! installed before it was verified and a binary cannot be tested before it was
//! placed. Every failure is wrapped in a [`FlowError`] naming the step and the
//! detected platform.
//!
//! # Usage
//!
//! ```ignore
//! let resolved = Detected::current()?.resolve(&formula, &version)?;
//! let fetched = resolved.fetch(&fetcher, &reporter).await?;
//! let installed = fetched.install(&config.bin_dir)?;
//! let tested = installed.smoke_test(&formula.test, formula.test_marker(), timeout).await?;
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::Reporter;
use crate::config::Config;
use crate::install::{self, InstallError};
use crate::io::download::{FetchError, Fetcher, VerifiedArtifact};
use crate::resolver::{self, UnresolvableArtifactError};
use crate::smoke::{self, SmokeReport, SmokeTestError};
use tapkit_schema::{
    ArtifactDescriptor, Formula, PlatformKey, SmokeTest, ToolName, UnsupportedPlatformError,
    Version,
};

/// Pipeline steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Classifying the host.
    Detect,
    /// Looking up the artifact.
    Resolve,
    /// Downloading and verifying.
    Fetch,
    /// Extracting and placing the executable.
    Install,
    /// Running the installed executable.
    SmokeTest,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Detect => "platform detection",
            Self::Resolve => "artifact resolution",
            Self::Fetch => "download",
            Self::Install => "install",
            Self::SmokeTest => "smoke test",
        })
    }
}

/// The underlying cause of a failed step.
#[derive(Error, Debug)]
pub enum StepError {
    /// See [`UnsupportedPlatformError`].
    #[error(transparent)]
    UnsupportedPlatform(#[from] UnsupportedPlatformError),
    /// See [`UnresolvableArtifactError`].
    #[error(transparent)]
    UnresolvableArtifact(#[from] UnresolvableArtifactError),
    /// Network failure or checksum mismatch; see [`FetchError`].
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Corrupt archive, missing executable, or filesystem failure.
    #[error(transparent)]
    Install(#[from] InstallError),
    /// See [`SmokeTestError`].
    #[error(transparent)]
    SmokeTest(#[from] SmokeTestError),
}

/// A failed run: which step, on which platform, and why.
#[derive(Error, Debug)]
#[error("{step} failed{}: {source}", on_platform(*platform))]
pub struct FlowError {
    /// Step that failed.
    pub step: Step,
    /// Detected platform, when detection got that far.
    pub platform: Option<PlatformKey>,
    /// Cause.
    #[source]
    pub source: StepError,
}

fn on_platform(platform: Option<PlatformKey>) -> String {
    platform.map(|p| format!(" on {p}")).unwrap_or_default()
}

impl FlowError {
    fn new(step: Step, platform: Option<PlatformKey>, source: impl Into<StepError>) -> Self {
        Self {
            step,
            platform,
            source: source.into(),
        }
    }

    /// Whether re-running the whole install might succeed.
    ///
    /// Only transport failures qualify. Checksum and archive failures must be
    /// looked at by a person before trying again.
    pub fn is_retryable(&self) -> bool {
        matches!(self.source, StepError::Fetch(FetchError::Network(_)))
    }
}

/// State 1: the host platform is known.
///
/// # Transitions
///
/// - [`resolve()`](Self::resolve) -> [`Resolved`]
#[derive(Debug, Clone, Copy)]
pub struct Detected {
    /// Host platform.
    pub platform: PlatformKey,
}

impl Detected {
    /// Classify the running host.
    pub fn current() -> Result<Self, FlowError> {
        let platform = PlatformKey::current().map_err(|e| FlowError::new(Step::Detect, None, e))?;
        tracing::debug!(%platform, "detected host platform");
        Ok(Self { platform })
    }

    /// Use an explicit platform instead of the host's.
    pub fn with_platform(platform: PlatformKey) -> Self {
        Self { platform }
    }

    /// Look up this platform's artifact at `version`.
    pub fn resolve(self, formula: &Formula, version: &Version) -> Result<Resolved, FlowError> {
        let descriptor = resolver::resolve(formula, version, self.platform)
            .map_err(|e| FlowError::new(Step::Resolve, Some(self.platform), e))?;
        Ok(Resolved {
            name: formula.name.clone(),
            version: version.clone(),
            descriptor,
        })
    }
}

/// State 2: the artifact to download is known.
///
/// # Transitions
///
/// - [`fetch()`](Self::fetch) -> [`Fetched`]
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Tool being installed.
    pub name: ToolName,
    /// Release being installed.
    pub version: Version,
    /// URL and expected checksum.
    pub descriptor: ArtifactDescriptor,
}

impl Resolved {
    /// Download and verify the artifact.
    pub async fn fetch<R: Reporter + ?Sized>(
        self,
        fetcher: &Fetcher,
        reporter: &R,
    ) -> Result<Fetched, FlowError> {
        let artifact = fetcher
            .fetch(&self.descriptor, &self.name, &self.version, reporter)
            .await
            .map_err(|e| FlowError::new(Step::Fetch, Some(self.descriptor.platform), e))?;
        Ok(Fetched {
            resolved: self,
            artifact,
        })
    }
}

/// State 3: verified archive bytes are in hand.
///
/// # Transitions
///
/// - [`install()`](Self::install) -> [`Installed`]
#[derive(Debug)]
pub struct Fetched {
    /// What was resolved.
    pub resolved: Resolved,
    /// Verified archive.
    pub artifact: VerifiedArtifact,
}

impl Fetched {
    /// Extract the executable and place it in `bin_dir`.
    pub fn install(self, bin_dir: &Path) -> Result<Installed, FlowError> {
        let platform = self.resolved.descriptor.platform;
        let path = install::install(&self.artifact, &self.resolved.name, bin_dir)
            .map_err(|e| FlowError::new(Step::Install, Some(platform), e))?;
        Ok(Installed {
            resolved: self.resolved,
            size: self.artifact.len(),
            path,
        })
    }
}

/// State 4: the executable is in place.
///
/// # Transitions
///
/// - [`smoke_test()`](Self::smoke_test) -> [`Tested`]
#[derive(Debug, Clone)]
pub struct Installed {
    /// What was resolved.
    pub resolved: Resolved,
    /// Archive size in bytes.
    pub size: u64,
    /// Installed executable.
    pub path: PathBuf,
}

impl Installed {
    /// Run the installed executable and check its output for `marker`.
    pub async fn smoke_test(
        self,
        test: &SmokeTest,
        marker: &str,
        timeout: Duration,
    ) -> Result<Tested, FlowError> {
        let platform = self.resolved.descriptor.platform;
        let report = smoke::run(&self.path, test, marker, timeout)
            .await
            .map_err(|e| FlowError::new(Step::SmokeTest, Some(platform), e))?;
        Ok(Tested {
            installed: self,
            report,
        })
    }
}

/// State 5: installed and smoke-tested.
#[derive(Debug, Clone)]
pub struct Tested {
    /// What was installed.
    pub installed: Installed,
    /// What the smoke test saw.
    pub report: SmokeReport,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// What was installed, and where.
    pub installed: Installed,
    /// Smoke test result, `None` when the caller skipped it.
    pub smoke: Option<SmokeReport>,
}

/// Drives Detect -> Resolve -> Fetch -> Install -> Smoke Test for one formula.
#[derive(Debug)]
pub struct Pipeline<'a, R: Reporter + ?Sized> {
    formula: &'a Formula,
    config: &'a Config,
    reporter: &'a R,
    version: Version,
    platform: Option<PlatformKey>,
    skip_test: bool,
}

impl<'a, R: Reporter + ?Sized> Pipeline<'a, R> {
    /// Install `formula` at its declared version according to `config`.
    pub fn new(formula: &'a Formula, config: &'a Config, reporter: &'a R) -> Self {
        Self {
            formula,
            config,
            reporter,
            version: formula.version.clone(),
            platform: None,
            skip_test: false,
        }
    }

    /// Install `version` instead of the formula's default.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Resolve for `platform` instead of detecting the host.
    pub fn platform(mut self, platform: PlatformKey) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Stop after installing.
    pub fn skip_test(mut self, skip: bool) -> Self {
        self.skip_test = skip;
        self
    }

    /// Run every step with a fetcher built from the config.
    pub async fn run(self) -> Result<Outcome, FlowError> {
        let mut fetcher = Fetcher::new(self.config.timeout)
            .map_err(|e| FlowError::new(Step::Fetch, self.platform, e))?;
        if let Some(dir) = &self.config.tmp_dir {
            fetcher = fetcher.with_tmp_root(dir);
        }
        self.run_with(&fetcher).await
    }

    /// Run every step using `fetcher` for the download.
    pub async fn run_with(self, fetcher: &Fetcher) -> Result<Outcome, FlowError> {
        let started = Instant::now();
        let name = &self.formula.name;
        let result = self.steps(fetcher).await;

        match &result {
            Ok(outcome) => self.reporter.done(
                name,
                &self.version,
                &format!(
                    "{} in {:.1}s",
                    outcome.installed.path.display(),
                    started.elapsed().as_secs_f64()
                ),
                Some(outcome.installed.size),
            ),
            Err(e) => {
                tracing::error!(step = %e.step, platform = ?e.platform, "{}", e.source);
                self.reporter.failed(name, &self.version, &e.to_string());
            }
        }
        result
    }

    async fn steps(&self, fetcher: &Fetcher) -> Result<Outcome, FlowError> {
        let detected = match self.platform {
            Some(platform) => Detected::with_platform(platform),
            None => Detected::current()?,
        };
        self.reporter.info(&format!("Platform: {}", detected.platform));

        let resolved = detected.resolve(self.formula, &self.version)?;
        self.reporter.info(&format!("Artifact: {}", resolved.descriptor.url));

        self.reporter.section("Fetching");
        let fetched = resolved.fetch(fetcher, self.reporter).await?;

        self.reporter.section("Installing");
        self.reporter.installing(&self.formula.name, &self.version);
        let installed = fetched.install(&self.config.bin_dir)?;

        if self.skip_test {
            self.reporter.warning("Smoke test skipped");
            return Ok(Outcome {
                installed,
                smoke: None,
            });
        }

        self.reporter.section("Testing");
        let tested = installed
            .smoke_test(
                &self.formula.test,
                self.formula.test_marker(),
                self.config.smoke_timeout,
            )
            .await?;

        Ok(Outcome {
            installed: tested.installed,
            smoke: Some(tested.report),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapkit_schema::{Arch, Os};

    #[test]
    fn error_names_step_and_platform() {
        let platform = PlatformKey::new(Os::MacOs, Arch::Arm64);
        let err = FlowError::new(
            Step::Resolve,
            Some(platform),
            UnresolvableArtifactError {
                tool: "dashy".to_string(),
                version: "0.1.0".to_string(),
                platform,
            },
        );
        assert_eq!(
            err.to_string(),
            "artifact resolution failed on aarch64-apple-darwin: no dashy 0.1.0 artifact is declared for aarch64-apple-darwin"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn detect_error_has_no_platform() {
        let err = FlowError::new(
            Step::Detect,
            None,
            PlatformKey::from_host("windows", "x86_64").unwrap_err(),
        );
        assert!(err.to_string().starts_with("platform detection failed: unsupported platform"));
    }

    #[test]
    fn unresolvable_platform_stops_at_resolve() {
        let mut formula = crate::formula::builtin().unwrap();
        let platform = PlatformKey::new(Os::Linux, Arch::Arm64);
        formula.checksums.remove(&platform);

        let err = Detected::with_platform(platform)
            .resolve(&formula, &formula.version)
            .unwrap_err();
        assert_eq!(err.step, Step::Resolve);
        assert_eq!(err.platform, Some(platform));
        assert!(matches!(err.source, StepError::UnresolvableArtifact(_)));
    }
}
