use std::sync::Arc;

use async_trait::async_trait;
use fancy_regex::Regex;
use ferrous_resolver_application::ports::ChainStage;
use ferrous_resolver_domain::{CacheKey, CachingConfig, Request, ResolverError, Response, ResponseType};
use tracing::{debug, info, warn};

use super::negative_tracker::NegativeQueryTracker;
use super::prefetch::PrefetchTracker;
use super::store::Cache;
use crate::wire;

/// `CachingResolver` : TTL-aware positive/negative cache in front of
/// `next`, with optional prefetching of hot keys.
pub struct CachingResolver {
    cache: Arc<Cache>,
    prefetch: Option<Arc<PrefetchTracker>>,
    negative_tracker: Option<NegativeQueryTracker>,
    config: CachingConfig,
    exclude: Vec<Regex>,
    next: Arc<dyn ChainStage>,
}

impl CachingResolver {
    pub fn new(
        config: CachingConfig,
        cache: Arc<Cache>,
        next: Arc<dyn ChainStage>,
    ) -> Result<Self, ResolverError> {
        let exclude = config
            .exclude
            .iter()
            .map(|pattern| {
                let body = pattern.strip_prefix('/').and_then(|p| p.strip_suffix('/')).unwrap_or(pattern);
                Regex::new(body).map_err(|e| ResolverError::Config(format!("invalid Caching.Exclude regex '{pattern}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let prefetch = config.prefetching.then(|| {
            Arc::new(PrefetchTracker::new(
                config.prefetch_expires,
                config.prefetch_threshold,
                config.prefetch_max_items_count,
            ))
        });

        let negative_tracker = config.negative_ttl_growth.then(|| {
            NegativeQueryTracker::new(
                std::time::Duration::from_secs(300),
                config.negative_frequency_threshold,
                config.negative_frequent_ttl.as_secs() as u32,
            )
        });

        Ok(Self {
            cache,
            prefetch,
            negative_tracker,
            config,
            exclude,
            next,
        })
    }

    /// Negative TTL for a just-resolved NXDOMAIN: the flat
    /// `cache_time_negative` unless repeat tracking is enabled, in which
    /// case repeated misses grow the TTL.
    fn negative_ttl_secs(&self, key: &CacheKey) -> u32 {
        let base = self.config.cache_time_negative.as_secs() as u32;
        match &self.negative_tracker {
            Some(tracker) => tracker.record_and_ttl(key, base),
            None => base,
        }
    }

    fn is_excluded(&self, qname: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(qname).unwrap_or(false))
    }
}

#[async_trait]
impl ChainStage for CachingResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, ResolverError> {
        if self.config.caching_disabled() {
            return self.next.resolve(request).await;
        }

        let msg = wire::parse(&request.wire)?;
        let Some((name, record_type)) = wire::question(&msg) else {
            return self.next.resolve(request).await;
        };
        let qname = name.to_utf8().to_ascii_lowercase();

        if self.is_excluded(&qname) {
            return self.next.resolve(request).await;
        }
        if let Some((address, source_prefix)) = wire::ecs_option(&msg) {
            if wire::ecs_is_multi_client(address, source_prefix) {
                return self.next.resolve(request).await;
            }
        }

        let key = CacheKey::new(&qname, record_type);

        if let Some((wire_bytes, elapsed, is_negative)) = self.cache.get(&key) {
            if let Some(tracker) = &self.prefetch {
                if tracker.record_access(&key) {
                    self.schedule_prefetch(key.clone(), request.clone());
                }
            }
            return self.build_cached_response(&wire_bytes, elapsed, &request.wire, is_negative);
        }

        let response = self.next.resolve(request).await?;
        self.store_if_cacheable(&key, &response);
        Ok(response)
    }

    fn stage_type(&self) -> &'static str {
        "caching"
    }

    fn is_enabled(&self) -> bool {
        !self.config.caching_disabled()
    }

    fn log_config(&self) {
        info!(
            min_caching_time = ?self.config.min_caching_time,
            max_caching_time = ?self.config.max_caching_time,
            cache_time_negative = ?self.config.cache_time_negative,
            max_items_count = self.config.max_items_count,
            prefetching = self.config.prefetching,
            "caching stage configured"
        );
    }
}

impl CachingResolver {
    fn build_cached_response(
        &self,
        cached_wire: &[u8],
        elapsed_secs: u32,
        request_wire: &[u8],
        is_negative: bool,
    ) -> Result<Response, ResolverError> {
        let request_msg = wire::parse(request_wire)?;
        let mut msg = wire::parse(cached_wire)?;
        wire::age_ttls(&mut msg, elapsed_secs);
        wire::rewrite_for_request(&mut msg, &request_msg);
        let wire_bytes = wire::to_bytes(&msg)?;
        let reason = if is_negative {
            "CACHED (negative)"
        } else {
            "CACHED"
        };
        Ok(Response::new(wire_bytes, ResponseType::Cached, reason))
    }

    /// Caches `response`'s wire message per invariants: truncated or
    /// CD-flagged responses, and responses with a multi-client ECS option,
    /// are never stored. EDNS OPT is stripped before storing.
    fn store_if_cacheable(&self, key: &CacheKey, response: &Response) {
        let Ok(mut msg) = wire::parse(&response.wire) else {
            return;
        };
        if wire::is_truncated(&msg) || wire::checking_disabled(&msg) {
            return;
        }
        if let Some((address, source_prefix)) = wire::ecs_option(&msg) {
            if wire::ecs_is_multi_client(address, source_prefix) {
                return;
            }
        }

        let is_negative = wire::is_nxdomain(&msg);
        let ttl_secs = if is_negative {
            self.negative_ttl_secs(key)
        } else {
            match wire::min_rr_ttl(&msg) {
                Some(min_ttl) => self.config.clamp_positive_ttl(min_ttl),
                None => return,
            }
        };
        if ttl_secs == 0 {
            return;
        }

        wire::strip_edns(&mut msg);
        let Ok(wire_bytes) = wire::to_bytes(&msg) else {
            return;
        };
        self.cache.put(key.clone(), wire_bytes, ttl_secs, is_negative);
    }

    fn schedule_prefetch(&self, key: CacheKey, request: Request) {
        let next = Arc::clone(&self.next);
        let cache = Arc::clone(&self.cache);
        let config_ttl_negative = self.config.cache_time_negative.as_secs() as u32;
        let min_caching = self.config.min_caching_time;
        let max_caching = self.config.max_caching_time;
        tokio::spawn(async move {
            match next.resolve(&request).await {
                Ok(response) => {
                    if let Ok(mut msg) = wire::parse(&response.wire) {
                        if wire::is_truncated(&msg) || wire::checking_disabled(&msg) {
                            return;
                        }
                        let is_negative = wire::is_nxdomain(&msg);
                        let ttl_secs = if is_negative {
                            config_ttl_negative
                        } else {
                            match wire::min_rr_ttl(&msg) {
                                Some(min_ttl) => min_ttl
                                    .clamp(min_caching.as_secs() as u32, max_caching.as_secs() as u32),
                                None => return,
                            }
                        };
                        wire::strip_edns(&mut msg);
                        if let Ok(wire_bytes) = wire::to_bytes(&msg) {
                            cache.metrics.record_prefetch_refresh();
                            cache.put(key, wire_bytes, ttl_secs, is_negative);
                        }
                    }
                }
                Err(e) => debug!(error = %e, "prefetch refresh failed"),
            }
        });
    }
}
