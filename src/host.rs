use crate::config::HostConfig;
use crate::layout::LayoutTemplate;
use crate::registry::{self, ClassAllowlist};
use crate::tree::TreeId;
use crate::value::{Bitmap, CallbackToken, LayoutId, NodeId, ResourceId};
use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Errors from resolving resources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("{0} not found")]
    DrawableNotFound(ResourceId),
    #[error("no image at `{0}`")]
    UriNotFound(String),
    #[error("cannot load `{uri}`: {reason}")]
    UriLoad { uri: String, reason: String },
}

/// The host’s resource namespace.
///
/// Layout files, drawables and URI loading belong to the host; the engine only asks for
/// decoded results. URI loads are synchronous and run on the applying thread.
pub trait Resources: Send + Sync {
    /// Resolves a layout template.
    fn layout(&self, id: LayoutId) -> Option<Arc<LayoutTemplate>>;

    /// Decodes a drawable resource.
    fn drawable(&self, id: ResourceId) -> Option<Bitmap>;

    /// Loads and decodes the image at a URI.
    fn open_uri(&self, uri: &str) -> Result<Bitmap, ResourceError> {
        Err(ResourceError::UriNotFound(uri.to_string()))
    }
}

/// An in-memory resource table.
#[derive(Debug, Default, Clone)]
pub struct ResourceTable {
    layouts: HashMap<LayoutId, Arc<LayoutTemplate>>,
    drawables: HashMap<ResourceId, Bitmap>,
    uris: HashMap<String, Bitmap>,
}

impl ResourceTable {
    pub fn new() -> ResourceTable {
        ResourceTable::default()
    }

    pub fn with_layout(mut self, id: LayoutId, template: LayoutTemplate) -> Self {
        self.layouts.insert(id, Arc::new(template));
        self
    }

    pub fn with_drawable(mut self, id: ResourceId, bitmap: Bitmap) -> Self {
        self.drawables.insert(id, bitmap);
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>, bitmap: Bitmap) -> Self {
        self.uris.insert(uri.into(), bitmap);
        self
    }
}

impl Resources for ResourceTable {
    fn layout(&self, id: LayoutId) -> Option<Arc<LayoutTemplate>> {
        self.layouts.get(&id).cloned()
    }

    fn drawable(&self, id: ResourceId) -> Option<Bitmap> {
        self.drawables.get(&id).cloned()
    }

    fn open_uri(&self, uri: &str) -> Result<Bitmap, ResourceError> {
        self.uris
            .get(uri)
            .cloned()
            .ok_or_else(|| ResourceError::UriNotFound(uri.to_string()))
    }
}

/// A click on a view that carries a callback token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub tree: TreeId,
    pub node: NodeId,
    pub token: CallbackToken,
}

struct CachedImage {
    bitmap: Bitmap,
    last_used: u64,
}

/// Decoded URI images, least recently used first out once over the byte budget.
struct UriCache {
    budget: usize,
    used: usize,
    clock: u64,
    images: HashMap<String, CachedImage>,
}

impl UriCache {
    fn new(budget: usize) -> UriCache {
        UriCache {
            budget,
            used: 0,
            clock: 0,
            images: HashMap::new(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, uri: &str) -> Option<Bitmap> {
        let now = self.tick();
        let image = self.images.get_mut(uri)?;
        image.last_used = now;
        Some(image.bitmap.clone())
    }

    fn insert(&mut self, uri: &str, bitmap: Bitmap) {
        self.remove(uri);
        let size = bitmap.byte_count();
        if size > self.budget {
            tracing::debug!(uri, size, budget = self.budget, "uri image too large to cache");
            return;
        }
        while self.used + size > self.budget {
            let oldest = self
                .images
                .iter()
                .min_by_key(|(_, image)| image.last_used)
                .map(|(uri, _)| uri.clone());
            match oldest {
                Some(oldest) => {
                    tracing::trace!(uri = %oldest, "evicting uri image");
                    self.remove(&oldest);
                }
                None => break,
            }
        }
        let last_used = self.tick();
        self.used += size;
        self.images
            .insert(uri.to_string(), CachedImage { bitmap, last_used });
    }

    fn remove(&mut self, uri: &str) -> bool {
        match self.images.remove(uri) {
            Some(image) => {
                self.used -= image.bitmap.byte_count();
                true
            }
            None => false,
        }
    }

    fn clear(&mut self) {
        self.images.clear();
        self.used = 0;
    }
}

/// Everything the engine needs from the side that applies descriptors.
pub struct HostContext {
    resources: Arc<dyn Resources>,
    allowlist: Arc<ClassAllowlist>,
    uri_cache: Mutex<UriCache>,
    click_sender: Sender<ClickEvent>,
    click_recv: Receiver<ClickEvent>,
}

impl HostContext {
    /// Creates a host context that inflates through the process-wide allowlist.
    pub fn new(resources: Arc<dyn Resources>) -> HostContext {
        let (click_sender, click_recv) = channel::unbounded();

        HostContext {
            resources,
            allowlist: registry::global(),
            uri_cache: Mutex::new(UriCache::new(HostConfig::default().uri_cache_bytes)),
            click_sender,
            click_recv,
        }
    }

    /// Uses a specific allowlist instead of the process-wide one.
    pub fn with_allowlist(mut self, allowlist: Arc<ClassAllowlist>) -> HostContext {
        self.allowlist = allowlist;
        self
    }

    /// Applies host settings. Replaces the URI cache, dropping anything already in it.
    pub fn with_config(mut self, config: &HostConfig) -> HostContext {
        self.uri_cache = Mutex::new(UriCache::new(config.uri_cache_bytes));
        self
    }

    pub fn resources(&self) -> &dyn Resources {
        &*self.resources
    }

    pub fn allowlist(&self) -> &ClassAllowlist {
        &self.allowlist
    }

    /// Loads an image by URI, reusing an earlier load of the same URI while it is still cached.
    ///
    /// Cached images are not revalidated; call [`HostContext::invalidate_uri`] when the content
    /// behind a URI changes.
    pub fn load_uri(&self, uri: &str) -> Result<Bitmap, ResourceError> {
        if let Some(bitmap) = self.uri_cache.lock().get(uri) {
            tracing::debug!(uri, "uri image cache hit");
            return Ok(bitmap.clone());
        }

        // not holding the lock while loading
        tracing::debug!(uri, "loading uri image");
        let bitmap = self.resources.open_uri(uri)?;
        self.uri_cache.lock().insert(uri, bitmap.clone());
        Ok(bitmap)
    }

    /// Forgets the cached image for `uri`, so the next apply loads it again. Returns whether
    /// anything was cached.
    pub fn invalidate_uri(&self, uri: &str) -> bool {
        self.uri_cache.lock().remove(uri)
    }

    /// Forgets all cached URI images.
    pub fn clear_uri_cache(&self) {
        self.uri_cache.lock().clear();
    }

    pub(crate) fn dispatch_click(&self, event: ClickEvent) {
        tracing::debug!(node = event.node.0, token = event.token.0, "dispatching click");
        // the receiver lives as long as self, so this cannot be disconnected
        let _ = self.click_sender.send(event);
    }

    /// Receives all pending click events.
    pub fn poll_clicks(&self) -> Vec<ClickEvent> {
        let mut events = Vec::new();
        loop {
            match self.click_recv.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingResources {
        loads: AtomicUsize,
    }

    impl Resources for CountingResources {
        fn layout(&self, _: LayoutId) -> Option<Arc<LayoutTemplate>> {
            None
        }

        fn drawable(&self, _: ResourceId) -> Option<Bitmap> {
            None
        }

        fn open_uri(&self, uri: &str) -> Result<Bitmap, ResourceError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if uri.starts_with("content://") {
                Ok(Bitmap::solid(1, 1, Color::GREEN))
            } else {
                Err(ResourceError::UriLoad {
                    uri: uri.to_string(),
                    reason: "unsupported scheme".into(),
                })
            }
        }
    }

    #[test]
    fn uri_images_are_cached() {
        let resources = Arc::new(CountingResources::default());
        let host = HostContext::new(resources.clone());
        host.load_uri("content://a").unwrap();
        host.load_uri("content://a").unwrap();
        assert_eq!(resources.loads.load(Ordering::SeqCst), 1);

        assert!(host.load_uri("file:///x").is_err());
        assert!(host.load_uri("file:///x").is_err());
        assert_eq!(resources.loads.load(Ordering::SeqCst), 3, "failures are not cached");

        host.clear_uri_cache();
        host.load_uri("content://a").unwrap();
        assert_eq!(resources.loads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn uri_cache_evicts_least_recently_used() {
        // room for two 1x1 images
        let resources = Arc::new(CountingResources::default());
        let host = HostContext::new(resources.clone()).with_config(&HostConfig {
            uri_cache_bytes: 8,
        });
        host.load_uri("content://a").unwrap();
        host.load_uri("content://b").unwrap();
        host.load_uri("content://a").unwrap();
        assert_eq!(resources.loads.load(Ordering::SeqCst), 2);

        host.load_uri("content://c").unwrap();
        host.load_uri("content://a").unwrap();
        assert_eq!(resources.loads.load(Ordering::SeqCst), 3, "a was used last");
        host.load_uri("content://b").unwrap();
        assert_eq!(resources.loads.load(Ordering::SeqCst), 4, "b was evicted");

        assert!(host.invalidate_uri("content://b"));
        assert!(!host.invalidate_uri("content://b"));
        host.load_uri("content://b").unwrap();
        assert_eq!(resources.loads.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn oversized_uri_images_are_not_cached() {
        let resources = Arc::new(CountingResources::default());
        let host = HostContext::new(resources.clone()).with_config(&HostConfig {
            uri_cache_bytes: 2,
        });
        host.load_uri("content://a").unwrap();
        host.load_uri("content://a").unwrap();
        assert_eq!(resources.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clicks_are_polled_in_order() {
        let host = HostContext::new(Arc::new(ResourceTable::new()));
        let tree = TreeId::new();
        for i in 0..3 {
            host.dispatch_click(ClickEvent {
                tree,
                node: NodeId(i),
                token: CallbackToken(i as u64),
            });
        }
        let events = host.poll_clicks();
        assert_eq!(
            events.iter().map(|e| e.node).collect::<Vec<_>>(),
            vec![NodeId(0), NodeId(1), NodeId(2)]
        );
        assert!(host.poll_clicks().is_empty());
    }

    #[test]
    fn resource_table_lookups() {
        let table = ResourceTable::new()
            .with_drawable(ResourceId(1), Bitmap::solid(2, 2, Color::RED))
            .with_uri("content://x", Bitmap::solid(1, 1, Color::BLUE));
        assert!(table.drawable(ResourceId(1)).is_some());
        assert!(table.drawable(ResourceId(2)).is_none());
        assert!(table.layout(LayoutId(1)).is_none());
        assert_eq!(
            table.open_uri("content://y").unwrap_err(),
            ResourceError::UriNotFound("content://y".into())
        );
    }
}
