use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::{Config, ListingKind};
use crate::downloader::{proxy_from_env, Downloader, ProgressFn};
use crate::error::Result;
use crate::listing::{local_names, provider_for};
use crate::progress::default_progress_fn;
use crate::reconcile::compute_missing;

// ──────────────────────────────────────────────────────────────────────────────
// Api
// ──────────────────────────────────────────────────────────────────────────────

/// Top-level entry point with a chainable builder API.
///
/// # Example
/// ```rust,no_run
/// use fwfetch::{Api, Config};
///
/// #[tokio::main]
/// async fn main() {
///     let config = Config::load(std::path::Path::new("fwfetch.toml")).unwrap();
///     let report = Api::from_config(&config)
///         .include_unstable(false)
///         .sync()
///         .await
///         .unwrap();
///     println!("downloaded {} files", report.downloaded.len());
/// }
/// ```
pub struct Api {
    webpage: String,
    downloadpage: String,
    target_folder: PathBuf,
    include_unstable: bool,
    listing: ListingKind,
    proxy: Option<String>,
    progress: Option<ProgressFn>,
}

/// What one run saw and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Firmware names on the listing page, in page order.
    pub remote: Vec<String>,
    /// Firmware names already in the target folder.
    pub local: BTreeSet<String>,
    /// Names selected for download.
    pub missing: Vec<String>,
    /// Files written during this run.
    pub downloaded: Vec<PathBuf>,
}

impl SyncReport {
    /// True when nothing had to be fetched.
    pub fn is_up_to_date(&self) -> bool {
        self.missing.is_empty()
    }
}

impl Api {
    /// Create an `Api` from a loaded configuration.
    ///
    /// Proxy is read from `HTTP_PROXY` / `HTTPS_PROXY` environment variables.
    pub fn from_config(config: &Config) -> Self {
        Self {
            webpage: config.server.webpage.clone(),
            downloadpage: config.server.downloadpage.clone(),
            target_folder: config.local.targetfolder.clone(),
            include_unstable: config.options.include_unstable,
            listing: config.options.listing,
            proxy: proxy_from_env(),
            progress: Some(default_progress_fn()),
        }
    }

    /// Override the target folder (builder).
    pub fn set_target_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_folder = dir.into();
        self
    }

    /// Whether builds whose name contains `unstable` are fetched (builder).
    pub fn include_unstable(mut self, include: bool) -> Self {
        self.include_unstable = include;
        self
    }

    /// Choose how the listing page is read (builder).
    pub fn set_listing(mut self, listing: ListingKind) -> Self {
        self.listing = listing;
        self
    }

    /// Set an explicit HTTP/HTTPS proxy URL (builder).
    pub fn set_proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_owned());
        self
    }

    /// Override the progress callback (builder).
    pub fn set_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Disable progress output (builder).
    pub fn no_progress(mut self) -> Self {
        self.progress = None;
        self
    }

    fn downloader(&self) -> Result<Downloader> {
        Downloader::with_config(self.proxy.as_deref(), self.progress.clone())
    }

    /// Work out which files are missing without downloading anything.
    pub async fn plan(&self) -> Result<SyncReport> {
        let downloader = self.downloader()?;
        self.plan_with(&downloader).await
    }

    async fn plan_with(&self, downloader: &Downloader) -> Result<SyncReport> {
        tracing::info!("determining binfiles available on {}", self.webpage);
        let remote = {
            let provider = provider_for(self.listing, downloader.clone(), &self.webpage);
            tracing::debug!(listing = provider.label());
            provider.remote_names().await?
        };
        tracing::info!("remote binfiles: {remote:?}");

        tracing::info!(
            "determining binfiles available locally in {}",
            self.target_folder.display()
        );
        let local = local_names(&self.target_folder)?;
        tracing::info!("local binfiles: {local:?}");

        if !self.include_unstable {
            tracing::info!("filtering out unstable binfiles");
        }
        let missing = compute_missing(&remote, &local, self.include_unstable);

        Ok(SyncReport {
            remote,
            local,
            missing,
            downloaded: Vec::new(),
        })
    }

    /// List, compare, and download every missing file, one at a time.
    ///
    /// The first failure aborts the run; files written before it stay.
    pub async fn sync(&self) -> Result<SyncReport> {
        let downloader = self.downloader()?;
        let mut report = self.plan_with(&downloader).await?;

        if report.is_up_to_date() {
            tracing::info!("{} is up-to-date", self.target_folder.display());
            return Ok(report);
        }
        tracing::info!("missing binfiles: {:?}", report.missing);

        for filename in &report.missing {
            let path = downloader
                .fetch(&self.downloadpage, filename, &self.target_folder)
                .await?;
            report.downloaded.push(path);
        }
        tracing::info!("downloaded {} binfiles", report.downloaded.len());

        Ok(report)
    }
}
