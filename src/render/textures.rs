//! Per-node height textures
//!
//! Textures follow node lifetime: requested when selection reports a node as
//! created, retired when it reports the node as released. Retired textures
//! go back to the device at the start of the next provisioning pass. A node
//! whose texture could not be created draws with a shared flat fallback and
//! stays pending until a later pass succeeds.

use std::collections::{BTreeSet, HashMap};

use super::device::{RenderDevice, TextureHandle};
use crate::core::types::Result;
use crate::lod::PatchKey;
use crate::terrain::HeightMap;

/// Outcome of one provisioning pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProvisionStats {
    pub created: usize,
    pub released: usize,
    pub failed: usize,
    /// Still waiting for a texture after this pass
    pub pending: usize,
}

#[derive(Debug, Default)]
pub struct HeightTextureCache {
    textures: HashMap<PatchKey, TextureHandle>,
    pending: BTreeSet<PatchKey>,
    retired: Vec<TextureHandle>,
    fallback: Option<TextureHandle>,
}

impl HeightTextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the shared flat fallback texture. Failure here is fatal.
    pub fn init_fallback(&mut self, device: &mut dyn RenderDevice, grid_size: u32) -> Result<()> {
        if self.fallback.is_none() {
            self.fallback = Some(device.create_height_texture(&HeightMap::flat(grid_size as usize))?);
        }
        Ok(())
    }

    /// Queue nodes that need a texture.
    pub fn request(&mut self, keys: impl IntoIterator<Item = PatchKey>) {
        self.pending.extend(keys);
    }

    /// Detach textures from nodes that no longer exist.
    ///
    /// Must run before [`request`](Self::request) for the same pass, since
    /// released ids may already be reused by newly created nodes.
    pub fn retire(&mut self, keys: impl IntoIterator<Item = PatchKey>) -> usize {
        let mut retired = 0;
        for key in keys {
            self.pending.remove(&key);
            if let Some(texture) = self.textures.remove(&key) {
                self.retired.push(texture);
                retired += 1;
            }
        }
        retired
    }

    /// Release retired textures, then try to create a texture for every
    /// pending node.
    ///
    /// `build` produces the height map for a node, or `None` if the node is
    /// gone (it is then dropped from the queue).
    pub fn provision<F>(&mut self, device: &mut dyn RenderDevice, mut build: F) -> ProvisionStats
    where
        F: FnMut(PatchKey) -> Option<HeightMap>,
    {
        let mut stats = ProvisionStats::default();
        for texture in self.retired.drain(..) {
            device.release_texture(texture);
            stats.released += 1;
        }

        let pending = std::mem::take(&mut self.pending);

        for key in pending {
            let Some(map) = build(key) else {
                continue;
            };
            match device.create_height_texture(&map) {
                Ok(texture) => {
                    if let Some(old) = self.textures.insert(key, texture) {
                        device.release_texture(old);
                    }
                    stats.created += 1;
                }
                Err(e) => {
                    log::warn!("Height texture for {:?} failed, using fallback: {}", key, e);
                    self.pending.insert(key);
                    stats.failed += 1;
                }
            }
        }

        stats.pending = self.pending.len();
        stats
    }

    /// Texture to bind for `key`: its own, else the fallback.
    pub fn texture_for(&self, key: PatchKey) -> Option<TextureHandle> {
        self.textures.get(&key).copied().or(self.fallback)
    }

    pub fn has_texture(&self, key: PatchKey) -> bool {
        self.textures.contains_key(&key)
    }

    pub fn is_pending(&self, key: PatchKey) -> bool {
        self.pending.contains(&key)
    }

    pub fn fallback(&self) -> Option<TextureHandle> {
        self.fallback
    }

    /// Node textures held (excluding the fallback)
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Textures waiting to go back to the device
    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    /// Release everything, fallback included.
    pub fn clear(&mut self, device: &mut dyn RenderDevice) {
        for texture in self.retired.drain(..) {
            device.release_texture(texture);
        }
        for (_, texture) in self.textures.drain() {
            device.release_texture(texture);
        }
        if let Some(fallback) = self.fallback.take() {
            device.release_texture(fallback);
        }
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lod::NodeId;
    use crate::render::RecordingDevice;

    fn key(node: u32) -> PatchKey {
        PatchKey::new(0, NodeId(node))
    }

    fn flat(_: PatchKey) -> Option<HeightMap> {
        Some(HeightMap::flat(3))
    }

    #[test]
    fn test_provision_and_release() {
        let mut device = RecordingDevice::new();
        let mut cache = HeightTextureCache::new();
        cache.init_fallback(&mut device, 3).unwrap();

        cache.request([key(1), key(2)]);
        let stats = cache.provision(&mut device, flat);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.pending, 0);
        assert_eq!(cache.len(), 2);
        assert_eq!(device.live_textures(), 3);

        assert_eq!(cache.retire([key(1)]), 1);
        assert!(!cache.has_texture(key(1)));
        assert_eq!(cache.retired_len(), 1);
        // Nothing goes back to the device until the next pass
        assert_eq!(device.live_textures(), 3);

        let stats = cache.provision(&mut device, flat);
        assert_eq!(stats.released, 1);
        assert_eq!(device.live_textures(), 2);
    }

    #[test]
    fn test_reused_id_keeps_new_request() {
        let mut device = RecordingDevice::new();
        let mut cache = HeightTextureCache::new();
        cache.request([key(1)]);
        cache.provision(&mut device, flat);

        // Node 1 released and its slot reused in the same selection pass
        cache.retire([key(1)]);
        cache.request([key(1)]);
        let stats = cache.provision(&mut device, flat);
        assert_eq!(stats.released, 1);
        assert_eq!(stats.created, 1);
        assert!(cache.has_texture(key(1)));
        assert_eq!(device.live_textures(), 1);
    }

    #[test]
    fn test_failure_falls_back_and_retries() {
        let mut device = RecordingDevice::new();
        let mut cache = HeightTextureCache::new();
        cache.init_fallback(&mut device, 3).unwrap();
        let fallback = cache.fallback().unwrap();

        device.fail_next_textures(1);
        cache.request([key(7)]);
        let stats = cache.provision(&mut device, flat);
        assert_eq!(stats.failed, 1);
        assert!(cache.is_pending(key(7)));
        assert_eq!(cache.texture_for(key(7)), Some(fallback));

        let stats = cache.provision(&mut device, flat);
        assert_eq!(stats.created, 1);
        assert!(!cache.is_pending(key(7)));
        assert_ne!(cache.texture_for(key(7)), Some(fallback));
    }

    #[test]
    fn test_retire_drops_pending() {
        let mut cache = HeightTextureCache::new();
        cache.request([key(3)]);
        assert_eq!(cache.retire([key(3)]), 0);
        assert_eq!(cache.pending_len(), 0);
    }

    #[test]
    fn test_missing_node_dropped_from_queue() {
        let mut device = RecordingDevice::new();
        let mut cache = HeightTextureCache::new();
        cache.request([key(4)]);
        let stats = cache.provision(&mut device, |_| None);
        assert_eq!(stats.created + stats.failed + stats.pending, 0);
    }

    #[test]
    fn test_fallback_failure_is_fatal() {
        let mut device = RecordingDevice::new();
        device.fail_next_textures(1);
        let mut cache = HeightTextureCache::new();
        assert!(cache.init_fallback(&mut device, 3).is_err());
    }

    #[test]
    fn test_reprovision_replaces_texture() {
        let mut device = RecordingDevice::new();
        let mut cache = HeightTextureCache::new();
        cache.request([key(1)]);
        cache.provision(&mut device, flat);
        cache.request([key(1)]);
        cache.provision(&mut device, flat);
        assert_eq!(device.live_textures(), 1);
        assert_eq!(device.textures_released(), 1);
    }

    #[test]
    fn test_clear_releases_all() {
        let mut device = RecordingDevice::new();
        let mut cache = HeightTextureCache::new();
        cache.init_fallback(&mut device, 3).unwrap();
        cache.request([key(1), key(2)]);
        cache.provision(&mut device, flat);
        cache.retire([key(2)]);
        cache.clear(&mut device);
        assert_eq!(device.live_textures(), 0);
        assert!(cache.fallback().is_none());
    }
}
