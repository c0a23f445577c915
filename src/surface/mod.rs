//! Planet and flat-terrain surfaces
//!
//! A [`Surface`] ties the pieces together for one body: its faces and their
//! quadtrees, the selector, the shared grid mesh, the height field, and the
//! per-node height textures. A frame is three steps:
//!
//! 1. [`Surface::update`] selects nodes for the camera (trees only).
//! 2. [`Surface::provision`] creates and releases height textures.
//! 3. [`Surface::draw`] issues one draw per visible node.
//!
//! [`Surface::frame`] runs all three.

pub mod config;

pub use config::{SurfaceConfig, SurfaceShape};

use crate::core::types::{DVec3, Result};
use crate::core::{Camera, Error};
use crate::lod::{Face, LodSelector, PatchKey, QuadNode, SelectionStats};
use crate::render::{
    DrawStats, EffectHandle, GridMesh, HeightTextureCache, ProvisionStats, RenderDevice, SurfaceRenderer,
};
use crate::terrain::{HeightField, HeightMap, HybridMultifractal};

/// Counters from the most recent frame
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub selection: SelectionStats,
    pub provision: ProvisionStats,
    pub draw: DrawStats,
}

pub struct Surface {
    config: SurfaceConfig,
    faces: Vec<Face>,
    selector: LodSelector,
    mesh: GridMesh,
    unit_grid: Vec<DVec3>,
    height_field: Box<dyn HeightField>,
    textures: HeightTextureCache,
    renderer: Option<SurfaceRenderer>,
    stats: FrameStats,
}

impl Surface {
    /// Build the faces and root nodes. No device work happens until
    /// [`initialise`](Self::initialise).
    pub fn new(config: SurfaceConfig, height_field: Box<dyn HeightField>) -> Result<Self> {
        let selector = LodSelector::new(config.lod_config()?)?;
        let mesh = GridMesh::new(config.grid_size)?;

        let faces = match config.shape {
            SurfaceShape::Planet { radius } => Face::cube_faces(radius),
            SurfaceShape::Flat { width } => vec![Face::flat(width)],
        };

        log::info!(
            "Surface: {:?}, {} faces, grid {}x{}, max level {}",
            config.shape,
            faces.len(),
            config.grid_size,
            config.grid_size,
            selector.config().max_level
        );

        Ok(Self {
            unit_grid: mesh.unit_points(),
            config,
            faces,
            selector,
            mesh,
            height_field,
            textures: HeightTextureCache::new(),
            renderer: None,
            stats: FrameStats::default(),
        })
    }

    /// Surface with the hybrid multifractal described by `config.height`.
    pub fn with_fractal(config: SurfaceConfig) -> Result<Self> {
        let field = HybridMultifractal::new(config.height.clone());
        Self::new(config, Box::new(field))
    }

    /// Upload the shared mesh and fallback texture, then give every root its
    /// height texture. Mesh or fallback failure is fatal.
    pub fn initialise(&mut self, device: &mut dyn RenderDevice, effect: EffectHandle) -> Result<()> {
        let mut renderer = SurfaceRenderer::new(device, effect, &self.mesh)?;
        renderer.set_wireframe(self.config.wireframe);
        self.textures.init_fallback(device, self.config.grid_size)?;
        self.renderer = Some(renderer);

        let roots: Vec<PatchKey> = self
            .faces
            .iter()
            .enumerate()
            .flat_map(|(index, face)| face.roots().iter().map(move |&root| PatchKey::new(index, root)))
            .collect();
        self.textures.request(roots);
        let stats = self.provision(device);
        log::info!("Surface initialised: {} root textures, {} pending", stats.created, stats.pending);
        Ok(())
    }

    /// Refine the quadtrees for `camera` and queue texture work.
    pub fn update(&mut self, camera: &Camera) -> &SelectionStats {
        let output = self.selector.select(&mut self.faces, camera);
        self.textures.retire(output.released);
        self.textures.request(output.created);
        self.stats.selection = output.stats;
        &self.stats.selection
    }

    /// Release retired height textures and create pending ones.
    pub fn provision(&mut self, device: &mut dyn RenderDevice) -> ProvisionStats {
        let size = self.config.grid_size as usize;
        let faces = &self.faces;
        let unit_grid = &self.unit_grid;
        let height_field = self.height_field.as_ref();
        let stats = self
            .textures
            .provision(device, |key| build_height_map(faces, unit_grid, height_field, size, key));
        self.stats.provision = stats;
        stats
    }

    /// Draw the visible nodes from the last [`update`](Self::update), lit
    /// from `sun_direction`.
    pub fn draw(
        &mut self,
        device: &mut dyn RenderDevice,
        camera: &Camera,
        sun_direction: DVec3,
    ) -> Result<DrawStats> {
        let renderer = self
            .renderer
            .as_ref()
            .ok_or_else(|| Error::Device("surface drawn before initialise".into()))?;
        let stats = renderer.draw(device, &self.faces, &self.textures, camera, sun_direction)?;
        self.stats.draw = stats;
        Ok(stats)
    }

    /// Update, provision, and draw.
    pub fn frame(
        &mut self,
        device: &mut dyn RenderDevice,
        camera: &Camera,
        sun_direction: DVec3,
    ) -> Result<&FrameStats> {
        self.update(camera);
        self.provision(device);
        self.draw(device, camera, sun_direction)?;

        let s = &self.stats;
        log::debug!(
            "frame: {} patches, depth {}, {} culled, {} splits, {} merges, {} draws ({} fallback), {} textures pending",
            s.selection.visible,
            s.selection.deepest_level,
            s.selection.culled,
            s.selection.splits,
            s.selection.merges,
            s.draw.draw_calls,
            s.draw.fallback_draws,
            s.provision.pending
        );
        Ok(&self.stats)
    }

    /// Return every texture to the device. The surface can be initialised again.
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        self.textures.clear(device);
        self.renderer = None;
    }

    /// Height map for any live node, sampled the same way provisioning does.
    pub fn height_map(&self, key: PatchKey) -> Option<HeightMap> {
        build_height_map(
            &self.faces,
            &self.unit_grid,
            self.height_field.as_ref(),
            self.config.grid_size as usize,
            key,
        )
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Visible nodes of face `index` from the last update
    pub fn visible_nodes(&self, index: usize) -> impl Iterator<Item = &QuadNode> {
        self.faces
            .get(index)
            .into_iter()
            .flat_map(|face| face.visible().iter().filter_map(move |&id| face.node(id)))
    }

    pub fn max_level(&self) -> u32 {
        self.selector.config().max_level
    }

    /// Deepest level reached by the last selection pass
    pub fn deepest_level(&self) -> u32 {
        self.stats.selection.deepest_level
    }

    /// Visible patches per face from the last selection pass
    pub fn patch_counts(&self) -> &[usize] {
        &self.stats.selection.visible_per_face
    }

    pub fn patch_count(&self) -> usize {
        self.stats.selection.visible
    }

    pub fn textures(&self) -> &HeightTextureCache {
        &self.textures
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn is_initialised(&self) -> bool {
        self.renderer.is_some()
    }
}

fn build_height_map(
    faces: &[Face],
    unit_grid: &[DVec3],
    height_field: &dyn HeightField,
    size: usize,
    key: PatchKey,
) -> Option<HeightMap> {
    let face = faces.get(key.face)?;
    let node = face.node(key.node)?;
    let points = face.grid_points(key.node, unit_grid)?;
    HeightMap::generate(height_field, &points, size, height_field.octaves_for_level(node.level))
}
