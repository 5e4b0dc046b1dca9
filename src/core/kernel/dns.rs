use crate::core::config::DnsSettings;
use crate::core::errors::StreamError;
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

/// Addresses for one hostname and the instant their records expire
#[derive(Debug, Clone)]
pub struct ResolvedHost {
    pub addrs: Vec<IpAddr>,
    pub valid_until: Instant,
}

impl ResolvedHost {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.valid_until
    }
}

/// A name lookup against some DNS backend
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup(&self, host: &str) -> Result<ResolvedHost, StreamError>;
}

/// Lookup against a single configured name server
pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryLookup {
    pub fn new(server: SocketAddr) -> Self {
        let name_servers =
            NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], name_servers);

        // Caching is handled by `DnsResolver` so it can be switched off
        let mut opts = ResolverOpts::default();
        opts.cache_size = 0;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

#[async_trait]
impl HostLookup for HickoryLookup {
    async fn lookup(&self, host: &str) -> Result<ResolvedHost, StreamError> {
        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| StreamError::DnsError {
                host: host.to_string(),
                message: e.to_string(),
            })?;

        let addrs: Vec<IpAddr> = lookup.iter().collect();
        if addrs.is_empty() {
            return Err(StreamError::DnsError {
                host: host.to_string(),
                message: "no addresses returned".to_string(),
            });
        }

        Ok(ResolvedHost {
            addrs,
            valid_until: lookup.valid_until(),
        })
    }
}

/// Hostname resolver with an optional TTL-honoring cache
///
/// Clones share the same cache.
#[derive(Clone)]
pub struct DnsResolver {
    lookup: Arc<dyn HostLookup>,
    cache: Option<Arc<RwLock<HashMap<String, ResolvedHost>>>>,
}

impl DnsResolver {
    /// Create a resolver talking to the configured name server
    pub fn from_settings(settings: &DnsSettings) -> Self {
        Self::with_lookup(Arc::new(HickoryLookup::new(settings.server)), settings.cached)
    }

    pub fn with_lookup(lookup: Arc<dyn HostLookup>, cached: bool) -> Self {
        Self {
            lookup,
            cache: cached.then(|| Arc::new(RwLock::new(HashMap::new()))),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    #[instrument(skip(self), fields(cached = self.cache.is_some()))]
    pub async fn resolve_host(&self, host: &str) -> Result<Vec<IpAddr>, StreamError> {
        let Some(cache) = &self.cache else {
            return Ok(self.lookup.lookup(host).await?.addrs);
        };

        let now = Instant::now();
        if let Some(entry) = cache.read().await.get(host) {
            if entry.is_fresh(now) {
                trace!("DNS cache hit");
                return Ok(entry.addrs.clone());
            }
        }

        let resolved = self.lookup.lookup(host).await?;
        let addrs = resolved.addrs.clone();

        let mut entries = cache.write().await;
        entries.retain(|_, entry| entry.is_fresh(now));
        if resolved.is_fresh(Instant::now()) {
            entries.insert(host.to_string(), resolved);
        }
        debug!(addresses = addrs.len(), "Resolved host");

        Ok(addrs)
    }
}

impl Resolve for DnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move {
            let host = name.as_str();
            let addrs = resolver.resolve_host(host).await.map_err(|e| {
                warn!(host = %host, error = %e, "DNS resolution failed");
                Box::new(e) as Box<dyn std::error::Error + Send + Sync>
            })?;
            // Port 0 is replaced by reqwest with the port from the URL
            let addrs: Addrs = Box::new(addrs.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok(addrs)
        })
    }
}
