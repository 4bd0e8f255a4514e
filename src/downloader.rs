use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::{Client, NoProxy, Proxy, Response};

use crate::error::{FetchError, Result};

/// Callback type for reporting download progress.
/// Arguments: source URL, bytes downloaded, total bytes (0 if unknown), MiB/s, is_complete
pub type ProgressFn = Arc<dyn Fn(&str, u64, u64, f64, bool) + Send + Sync>;

/// HTTP side of a sync run: reads the listing page and saves firmware files.
///
/// The underlying client is built once and reused for every request of the
/// run; it is released when the `Downloader` is dropped.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    /// Optional progress callback.
    pub progress: Option<ProgressFn>,
}

impl Downloader {
    /// Create a downloader without proxy or progress reporting.
    pub fn new() -> Result<Self> {
        Self::with_config(None, None)
    }

    /// Create a downloader with explicit configuration.
    pub fn with_config(proxy: Option<&str>, progress: Option<ProgressFn>) -> Result<Self> {
        Ok(Self {
            client: build_client(proxy)?,
            progress,
        })
    }

    /// GET `url` and return the body as text.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        tracing::debug!(%url, "fetching listing page");
        let resp = self.get(url).await?;
        resp.text().await.map_err(|e| FetchError::http(url, e))
    }

    /// Download `{base_url}/{filename}` into `target_folder/filename`.
    ///
    /// An existing file of the same name is truncated. If the transfer
    /// breaks halfway the partial file is left behind.
    pub async fn fetch(
        &self,
        base_url: &str,
        filename: &str,
        target_folder: &Path,
    ) -> Result<PathBuf> {
        let url = file_url(base_url, filename);
        let dest_path = target_folder.join(filename);
        tracing::info!("downloading {filename} to {}", target_folder.display());
        tracing::debug!(%url, path = %dest_path.display());

        let resp = self.get(&url).await?;

        std::fs::create_dir_all(target_folder).map_err(|e| FetchError::io(target_folder, e))?;
        let mut file =
            std::fs::File::create(&dest_path).map_err(|e| FetchError::io(&dest_path, e))?;

        let total = resp.content_length().unwrap_or(0);
        let mut downloaded: u64 = 0;
        let mut stream = resp.bytes_stream();
        let start = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::http(&url, e))?;
            downloaded += chunk.len() as u64;
            file.write_all(&chunk)
                .map_err(|e| FetchError::io(&dest_path, e))?;
            self.report(&url, downloaded, total, start, false);
        }
        file.flush().map_err(|e| FetchError::io(&dest_path, e))?;
        self.report(&url, downloaded, total, start, true);

        Ok(dest_path)
    }

    async fn get(&self, url: &str) -> Result<Response> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::http(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status,
            });
        }
        Ok(resp)
    }

    fn report(&self, src: &str, downloaded: u64, total: u64, start: Instant, complete: bool) {
        if let Some(progress) = &self.progress {
            let elapsed = start.elapsed().as_secs_f64();
            let mib_per_sec = if elapsed > 0.0 {
                (downloaded as f64) / (1024.0 * 1024.0) / elapsed
            } else {
                0.0
            };
            progress(src, downloaded, total, mib_per_sec, complete);
        }
    }
}

/// Build the HTTP client, optionally with proxy support. Redirects are
/// followed with reqwest's default policy.
fn build_client(proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("fwfetch/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url)
            .map_err(|e| FetchError::http(proxy_url, e))?
            .no_proxy(NoProxy::from_env());
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(|e| FetchError::http("<client>", e))
}

/// Join a base URL and a filename with exactly one `/`.
pub fn file_url(base_url: &str, filename: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), filename)
}

/// Proxy from `HTTP_PROXY` / `HTTPS_PROXY`, first non-empty wins. Hosts in
/// `NO_PROXY` bypass it.
pub fn proxy_from_env() -> Option<String> {
    std::env::var("HTTP_PROXY")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HTTPS_PROXY").ok().filter(|s| !s.is_empty()))
}
