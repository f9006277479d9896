//! Image source resolution for server-side rendering.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use canvas_renderer::{AssetFetcher, RenderError, RenderResult};
use url::{Host, Url};

use crate::assets::AssetStore;

/// Upper bound on one remote image download, connection included.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on establishing a connection to a remote image host.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// HTTP client used for remote image downloads.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Resolves image sources for the export renderer.
///
/// URLs pointing at this server's `/images/` route are read straight from the
/// asset store. Other `http(s)` URLs are downloaded, but only from public
/// hosts, within [`FETCH_TIMEOUT`] and up to `max_bytes`.
pub struct StoreFetcher {
    store: Arc<dyn AssetStore>,
    images_base: Url,
    http: reqwest::Client,
    max_bytes: usize,
    timeout: Duration,
}

impl StoreFetcher {
    /// Create a fetcher for a server reachable at `public_base`.
    ///
    /// # Errors
    ///
    /// Returns an error if `public_base` cannot be a base URL.
    pub fn new(
        store: Arc<dyn AssetStore>,
        public_base: &Url,
        http: reqwest::Client,
        max_bytes: usize,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            store,
            images_base: public_base.join("images/")?,
            http,
            max_bytes,
            timeout: FETCH_TIMEOUT,
        })
    }

    /// Override the per-download deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Object key for a source served by this server, if it is one.
    fn local_key<'a>(&self, src: &'a str) -> Option<&'a str> {
        src.strip_prefix(self.images_base.as_str())
            .or_else(|| src.strip_prefix("/images/"))
    }

    /// Refuse hosts that resolve to loopback, private or link-local
    /// addresses, unless they are this server's own origin.
    async fn check_host(&self, url: &Url) -> RenderResult<()> {
        if url.origin() == self.images_base.origin() {
            return Ok(());
        }
        let addrs: Vec<IpAddr> = match url.host() {
            Some(Host::Ipv4(ip)) => vec![ip.into()],
            Some(Host::Ipv6(ip)) => vec![ip.into()],
            Some(Host::Domain(domain)) => {
                let port = url.port_or_known_default().unwrap_or(80);
                tokio::net::lookup_host((domain, port))
                    .await
                    .map_err(|e| RenderError::Resource(format!("{domain}: {e}")))?
                    .map(|addr| addr.ip())
                    .collect()
            }
            None => return Err(RenderError::Resource("Image URL has no host".to_string())),
        };
        if addrs.iter().copied().any(is_internal) {
            return Err(RenderError::Resource(format!(
                "Refusing to fetch image from internal host {}",
                url.host_str().unwrap_or("?")
            )));
        }
        Ok(())
    }

    async fn download(&self, url: Url) -> RenderResult<Vec<u8>> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RenderError::Resource(e.to_string()))?;

        let too_large = || {
            RenderError::Resource(format!("Image exceeds {} byte limit", self.max_bytes))
        };
        if response
            .content_length()
            .is_some_and(|len| len > u64::try_from(self.max_bytes).unwrap_or(u64::MAX))
        {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| RenderError::Resource(e.to_string()))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Addresses a rendering request must not reach.
fn is_internal(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                // Carrier-grade NAT, 100.64.0.0/10
                || (a == 100 && (b & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_internal(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

#[async_trait]
impl AssetFetcher for StoreFetcher {
    async fn fetch(&self, src: &str) -> RenderResult<Vec<u8>> {
        if let Some(key) = self.local_key(src) {
            let asset = self
                .store
                .get(key)
                .await
                .map_err(|e| RenderError::Resource(e.to_string()))?;
            return Ok(asset.bytes);
        }

        let url = Url::parse(src).map_err(|e| RenderError::Resource(format!("{src}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RenderError::Resource(format!(
                "Unsupported image scheme: {}",
                url.scheme()
            )));
        }
        self.check_host(&url).await?;
        tracing::debug!("Downloading image from {}", url.host_str().unwrap_or("?"));

        tokio::time::timeout(self.timeout, self.download(url))
            .await
            .map_err(|_| RenderError::Resource(format!("Image download timed out: {src}")))?
    }
}
