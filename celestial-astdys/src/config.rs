use crate::descriptor::{CatalogDescriptor, OSCULATING};
use crate::download::{default_user_agent, Fetcher, HttpFetcher, DEFAULT_CONNECT_TIMEOUT};
use crate::error::Result;
use crate::store::CatalogStore;

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory that descriptor paths are resolved against.
    pub root_dir: PathBuf,

    pub default_type: String,

    /// Limit on establishing the HTTP connection.
    pub connect_timeout: Duration,

    /// Deadline for a whole download, body included. `None` lets a slow
    /// transfer run as long as bytes keep arriving.
    pub http_timeout: Option<Duration>,

    pub user_agent: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            default_type: OSCULATING.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            http_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Fluent construction of a [`CatalogStore`].
///
/// Starts with both built-in descriptors registered and an [`HttpFetcher`]
/// configured from the timeouts and user agent.
pub struct CatalogStoreBuilder {
    config: StoreConfig,
    descriptors: Vec<CatalogDescriptor>,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl CatalogStoreBuilder {
    pub fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            descriptors: CatalogDescriptor::builtins(),
            fetcher: None,
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_root_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.root_dir = dir.into();
        self
    }

    pub fn with_default_type(mut self, catalog_type: impl Into<String>) -> Self {
        self.config.default_type = catalog_type.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Register a descriptor, replacing any with the same catalog type.
    pub fn with_descriptor(mut self, descriptor: CatalogDescriptor) -> Self {
        self.descriptors
            .retain(|d| d.catalog_type != descriptor.catalog_type);
        self.descriptors.push(descriptor);
        self
    }

    pub fn without_builtin_descriptors(mut self) -> Self {
        self.descriptors.clear();
        self
    }

    /// Replace the HTTP fetcher, e.g. with a local mirror.
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// # Errors
    /// [`crate::Error::Config`] when a descriptor is invalid or the default
    /// type has no descriptor.
    pub fn build(self) -> Result<CatalogStore> {
        let fetcher = self.fetcher.unwrap_or_else(|| {
            Box::new(
                HttpFetcher::new(self.config.connect_timeout, self.config.user_agent.clone())
                    .with_timeout(self.config.http_timeout),
            )
        });
        CatalogStore::with_parts(self.config, self.descriptors, fetcher)
    }
}

impl Default for CatalogStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
