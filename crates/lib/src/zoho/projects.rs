//! Cached list of active projects (ticket destinations).

use super::{ReferenceItem, TicketBackend, ZohoError};
use crate::cache::CacheStore;
use std::sync::Arc;
use std::time::Duration;

pub const PROJECTS_CACHE_KEY: &str = "zoho_projects";

/// Project list backed by a shared cache. A cached copy is returned as-is; on a miss the
/// backend is queried and the result stored with the configured TTL. Concurrent misses may
/// both fetch and both write; the values are equivalent so either write is fine.
#[derive(Clone)]
pub struct ProjectCatalog {
    cache: Arc<dyn CacheStore>,
    backend: Arc<dyn TicketBackend>,
    ttl: Duration,
}

impl ProjectCatalog {
    pub fn new(cache: Arc<dyn CacheStore>, backend: Arc<dyn TicketBackend>, ttl: Duration) -> Self {
        Self {
            cache,
            backend,
            ttl,
        }
    }

    pub async fn projects(&self) -> Result<Vec<ReferenceItem>, ZohoError> {
        if let Some(cached) = self.cache.get(PROJECTS_CACHE_KEY).await {
            match serde_json::from_str::<Vec<ReferenceItem>>(&cached) {
                Ok(list) => return Ok(list),
                Err(e) => log::debug!("ignoring undecodable cached project list: {}", e),
            }
        }

        let projects = self.backend.list_active_projects().await?;
        match serde_json::to_string(&projects) {
            Ok(encoded) => {
                self.cache.put(PROJECTS_CACHE_KEY, encoded, self.ttl).await;
                log::debug!("cached {} project(s) for {:?}", projects.len(), self.ttl);
            }
            Err(e) => log::warn!("project list not cached: {}", e),
        }
        Ok(projects)
    }
}
