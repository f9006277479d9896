//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use url::Url;

/// Default port for the canvas server.
pub const DEFAULT_PORT: u16 = 9473; // "SAOR" on phone keypad

/// Default upper bound on request bodies (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Command-line arguments and environment for the server.
#[derive(Debug, Clone, Parser)]
#[command(name = "saorsa-canvas")]
#[command(about = "Saorsa Canvas asset and export service")]
#[command(version)]
pub struct ServerConfig {
    /// Port to listen on
    #[arg(long, env = "CANVAS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "CANVAS_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Directory for uploaded images; kept in memory when unset
    #[arg(long, env = "CANVAS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "CANVAS_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Base URL clients use to reach this server (e.g., <https://canvas.example.com/>)
    #[arg(long, env = "CANVAS_PUBLIC_URL")]
    pub public_url: Option<Url>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            data_dir: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            public_url: None,
        }
    }
}

impl ServerConfig {
    /// Socket address to listen on.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Base URL for links handed back to clients, always ending in `/`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address does not form a valid URL.
    pub fn public_base(&self) -> Result<Url, url::ParseError> {
        let mut base = match &self.public_url {
            Some(url) => url.clone(),
            None => Url::parse(&format!("http://{}/", self.socket_addr()))?,
        };
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["saorsa-canvas"]).expect("parse");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_flags() {
        let config = ServerConfig::try_parse_from([
            "saorsa-canvas",
            "--port",
            "8080",
            "--bind",
            "0.0.0.0",
            "--data-dir",
            "/tmp/canvas",
            "--public-url",
            "https://canvas.example.com/app",
        ])
        .expect("parse");
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/canvas")));
        assert_eq!(
            config.public_base().expect("url").as_str(),
            "https://canvas.example.com/app/"
        );
    }

    #[test]
    fn test_public_base_from_bind() {
        let config = ServerConfig {
            port: 9000,
            ..Default::default()
        };
        assert_eq!(
            config.public_base().expect("url").as_str(),
            "http://127.0.0.1:9000/"
        );
    }
}
