//! # Batch Controller
//!
//! Turns an unbounded stream of draw submissions into a bounded sequence of
//! draw calls. Drawing code never sees individual batches: when the current
//! batch runs out of vertex room or texture slots the controller moves on to
//! the next pooled batch, creating one if the pool is exhausted.
//!
//! ## Ordering
//!
//! Batches are flushed in pool order, so the GPU sees submissions in the
//! order they were made. Stencil submissions go to a separate pool that is
//! flushed after every regular batch of the frame.
//!
//! ## Lifetime
//!
//! Batches are never freed. After a flush the cursor rewinds to batch 0 and
//! the pool is reused by the next frame.

use thiserror::Error;

use crate::render::backend::{Render, RenderError, RenderMode, Shader, Texture};
use crate::render::batch::{Batch, VERTICES_PER_QUAD};
use crate::render::vertex::{Transform, VertexGroup};

/// Vertices per batch when nothing else is configured
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Result type for batch controller operations
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur while submitting or flushing batches
#[derive(Debug, Error)]
pub enum BatchError {
    /// Submissions arrived before [`BatchController::start`]
    #[error("Batch controller has not been started")]
    NotStarted,

    /// The render back end failed
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),
}

/// Ordered, growable pool of identically sized batches
#[derive(Debug)]
struct BatchPool {
    batches: Vec<Batch>,
    current: usize,
    max_size: usize,
    shader: Shader,
    mode: RenderMode,
    stencil: bool,
}

impl BatchPool {
    fn new(max_size: usize, shader: Shader, mode: RenderMode, stencil: bool) -> Self {
        Self {
            batches: vec![Batch::new(max_size, shader, mode, stencil)],
            current: 0,
            max_size,
            shader,
            mode,
            stencil,
        }
    }

    fn advance(&mut self) {
        self.current += 1;
        if self.current == self.batches.len() {
            log::debug!(
                "Allocating {}batch #{} ({} vertices)",
                if self.stencil { "stencil " } else { "" },
                self.current,
                self.max_size
            );
            self.batches
                .push(Batch::new(self.max_size, self.shader, self.mode, self.stencil));
        }
    }

    fn current_batch(&mut self) -> &mut Batch {
        &mut self.batches[self.current]
    }

    fn add_figure(&mut self, group: &VertexGroup, transform: &Transform, use_camera: bool, is_font: bool) {
        if self.current_batch().is_full(VERTICES_PER_QUAD) {
            self.advance();
        }
        // A fresh batch always has room for one submission.
        self.current_batch().add_vertices(group, use_camera, transform, is_font);
    }

    fn add_texture(&mut self, texture: &Texture) -> u32 {
        loop {
            let batch = self.current_batch();
            if !batch.is_full(VERTICES_PER_QUAD) {
                if let Some(slot) = batch.add_texture(texture) {
                    return slot;
                }
            }
            self.advance();
        }
    }

    fn finish_and_render(&mut self, render: &mut dyn Render) -> BatchResult<()> {
        let mut first_error = None;
        for batch in &mut self.batches[..=self.current] {
            batch.finish();
            if let Err(e) = batch.render(render) {
                first_error.get_or_insert(e);
            }
        }
        self.current = 0;
        first_error.map_or(Ok(()), |e| Err(BatchError::Render(e)))
    }

    fn pending_vertices(&self) -> usize {
        self.batches[..=self.current].iter().map(Batch::vert_count).sum()
    }
}

/// Pool and dispatcher for 2D draw submissions
#[derive(Debug)]
pub struct BatchController {
    max_size: usize,
    mode: RenderMode,
    pools: Option<(BatchPool, BatchPool)>,
}

impl BatchController {
    /// Create an unstarted controller whose batches hold `max_size` vertices
    ///
    /// Sizes below one quad are raised to one quad.
    pub fn new(max_size: usize) -> Self {
        Self::with_mode(max_size, RenderMode::Triangles)
    }

    /// Create an unstarted controller using a specific primitive topology
    pub fn with_mode(max_size: usize, mode: RenderMode) -> Self {
        if max_size < VERTICES_PER_QUAD {
            log::warn!("Batch size {max_size} cannot hold a quad, using {VERTICES_PER_QUAD}");
        }
        Self {
            max_size: max_size.max(VERTICES_PER_QUAD),
            mode,
            pools: None,
        }
    }

    /// Compile the batch shader and allocate batch #0 and the stencil batch
    ///
    /// Calling `start` again discards every pooled batch.
    pub fn start(&mut self, render: &mut dyn Render) -> BatchResult<()> {
        let shader = render.create_batch_shader()?;
        self.pools = Some((
            BatchPool::new(self.max_size, shader, self.mode, false),
            BatchPool::new(self.max_size, shader, self.mode, true),
        ));
        log::debug!("Batch controller started ({} vertices per batch)", self.max_size);
        Ok(())
    }

    /// True once [`BatchController::start`] succeeded
    pub fn is_started(&self) -> bool {
        self.pools.is_some()
    }

    fn main_pool(&mut self) -> BatchResult<&mut BatchPool> {
        self.pools.as_mut().map(|(main, _)| main).ok_or(BatchError::NotStarted)
    }

    fn stencil_pool(&mut self) -> BatchResult<&mut BatchPool> {
        self.pools.as_mut().map(|(_, stencil)| stencil).ok_or(BatchError::NotStarted)
    }

    /// Submit an untextured (or already slotted) triangle or quad
    pub fn add_figure(&mut self, group: &VertexGroup, transform: &Transform, use_camera: bool, is_font: bool) -> BatchResult<()> {
        self.main_pool()?.add_figure(group, transform, use_camera, is_font);
        Ok(())
    }

    /// Reserve a slot for `texture` in a batch that can still take a quad
    ///
    /// The returned 1-based slot is valid for the next
    /// [`BatchController::add_figure`] call.
    pub fn add_texture(&mut self, texture: &Texture) -> BatchResult<u32> {
        Ok(self.main_pool()?.add_texture(texture))
    }

    /// Submit a textured figure; its tex-id is set to the reserved slot
    pub fn add_textured_figure(
        &mut self,
        group: &VertexGroup,
        texture: &Texture,
        transform: &Transform,
        use_camera: bool,
        is_font: bool,
    ) -> BatchResult<u32> {
        let pool = self.main_pool()?;
        let slot = pool.add_texture(texture);
        let mut group = group.clone();
        group.set_tex_id(slot);
        pool.add_figure(&group, transform, use_camera, is_font);
        Ok(slot)
    }

    /// Submit a figure to the stencil pass
    pub fn add_stencil_figure(&mut self, group: &VertexGroup, transform: &Transform, use_camera: bool, is_font: bool) -> BatchResult<()> {
        self.stencil_pool()?.add_figure(group, transform, use_camera, is_font);
        Ok(())
    }

    /// Submit a textured figure to the stencil pass
    pub fn add_stencil_textured_figure(
        &mut self,
        group: &VertexGroup,
        texture: &Texture,
        transform: &Transform,
        use_camera: bool,
        is_font: bool,
    ) -> BatchResult<u32> {
        let pool = self.stencil_pool()?;
        let slot = pool.add_texture(texture);
        let mut group = group.clone();
        group.set_tex_id(slot);
        pool.add_figure(&group, transform, use_camera, is_font);
        Ok(slot)
    }

    /// Flush every used batch in order, then the stencil batches
    ///
    /// Every batch is flushed and rewound even when one of them fails; the
    /// first failure is returned.
    pub fn finish_and_render(&mut self, render: &mut dyn Render) -> BatchResult<()> {
        let (main, stencil) = self.pools.as_mut().ok_or(BatchError::NotStarted)?;
        let main_result = main.finish_and_render(render);
        let stencil_result = stencil.finish_and_render(render);
        main_result.and(stencil_result)
    }

    /// Vertices per batch
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Regular batches allocated so far
    pub fn batch_count(&self) -> usize {
        self.pools.as_ref().map_or(0, |(main, _)| main.batches.len())
    }

    /// Index of the batch currently receiving submissions
    pub fn current_batch_index(&self) -> usize {
        self.pools.as_ref().map_or(0, |(main, _)| main.current)
    }

    /// A regular batch by pool index
    pub fn batch(&self, index: usize) -> Option<&Batch> {
        self.pools.as_ref().and_then(|(main, _)| main.batches.get(index))
    }

    /// A stencil batch by pool index
    pub fn stencil_batch(&self, index: usize) -> Option<&Batch> {
        self.pools.as_ref().and_then(|(_, stencil)| stencil.batches.get(index))
    }

    /// Vertices waiting for the next flush, stencil pass included
    pub fn pending_vertices(&self) -> usize {
        self.pools
            .as_ref()
            .map_or(0, |(main, stencil)| main.pending_vertices() + stencil.pending_vertices())
    }
}

impl Default for BatchController {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}
