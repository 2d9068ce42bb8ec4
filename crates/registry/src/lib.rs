pub mod quay;
pub mod webhook;

use std::{collections::HashMap, sync::Mutex};

use anyhow::Result;
use async_trait::async_trait;

/// Capability for resolving a mutable registry tag to an immutable image
/// identifier. Each call is a fresh lookup; no caching, no retries.
#[async_trait]
pub trait TagResolver: Send + Sync {
    async fn resolve(&self, repository: &str, tag: &str) -> Result<String>;
}

/// Capability for applying a tag to an existing image within a repository.
/// The write has PUT semantics: applying it twice with the same arguments
/// produces the same end state.
#[async_trait]
pub trait Tagger: Send + Sync {
    async fn tag(&self, repository: &str, image_id: &str, tag: &str) -> Result<()>;
}

/// In-memory [`TagResolver`] serving a preloaded `(repository, tag)` map.
/// Unknown keys resolve to an empty identifier, keeping the no-op default
/// safely callable.
#[derive(Default)]
pub struct MemoryTagResolver {
    images: Mutex<HashMap<(String, String), String>>,
}

impl MemoryTagResolver {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&self, repository: &str, tag: &str, image_id: &str) {
        self.images
            .lock()
            .unwrap()
            .insert((repository.to_string(), tag.to_string()), image_id.to_string());
    }
}

#[async_trait]
impl TagResolver for MemoryTagResolver {
    async fn resolve(&self, repository: &str, tag: &str) -> Result<String> {
        let images = self.images.lock().unwrap();
        Ok(images.get(&(repository.to_string(), tag.to_string())).cloned().unwrap_or_default())
    }
}

/// One tag application, in the order the tagger received it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AppliedTag {
    pub repository: String,
    pub image_id: String,
    pub tag: String,
}

/// In-memory [`Tagger`] that models the registry's `tag -> image id` mapping
/// and keeps an ordered history of every application. Give each test its own
/// instance; the interior lock does not coordinate across shared fixtures.
#[derive(Default)]
pub struct MemoryTagger {
    inner: Mutex<MemoryTaggerState>,
}

#[derive(Default)]
struct MemoryTaggerState {
    mapping: HashMap<String, String>,
    applied: Vec<AppliedTag>,
}

impl MemoryTagger {
    pub fn new() -> Self { Self::default() }

    /// The registry's current `tag -> image id` mapping.
    pub fn mapping(&self) -> HashMap<String, String> {
        self.inner.lock().unwrap().mapping.clone()
    }

    /// Every tag application, in order.
    pub fn applied(&self) -> Vec<AppliedTag> { self.inner.lock().unwrap().applied.clone() }

    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.mapping.clear();
        inner.applied.clear();
    }
}

#[async_trait]
impl Tagger for MemoryTagger {
    async fn tag(&self, repository: &str, image_id: &str, tag: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.mapping.insert(tag.to_string(), image_id.to_string());
        inner.applied.push(AppliedTag {
            repository: repository.to_string(),
            image_id: image_id.to_string(),
            tag: tag.to_string(),
        });
        Ok(())
    }
}
