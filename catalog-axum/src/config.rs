//! Settings of the HTTP adapter: where it listens and how large some of its
//! responses get.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Settings of the catalog HTTP server.
///
/// # Examples
///
/// ```
/// use catalog_axum::config::AxumConfig;
///
/// let config = AxumConfig::default();
/// assert_eq!(config.leaf_page_limit, 10);
///
/// let local = AxumConfig {
///     bind_address: "127.0.0.1:3000".parse().unwrap(),
///     leaf_page_limit: 25,
///     raw_preview_bytes: 1024,
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AxumConfig {
    /// The socket the server listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// The page size for leaf categories when the request does not give one
    #[serde(default = "default_leaf_page_limit")]
    pub leaf_page_limit: usize,

    /// How much of the product file the raw endpoint returns
    #[serde(default = "default_raw_preview_bytes")]
    pub raw_preview_bytes: usize,
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

fn default_leaf_page_limit() -> usize {
    10
}

fn default_raw_preview_bytes() -> usize {
    400
}

impl Default for AxumConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            leaf_page_limit: default_leaf_page_limit(),
            raw_preview_bytes: default_raw_preview_bytes(),
        }
    }
}
