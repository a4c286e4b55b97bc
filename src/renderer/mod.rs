mod machinery;
mod worker;

use std::num::NonZeroUsize;

pub use crate::renderer::machinery::render;

use crate::{
    geometry::FloatType,
    util::{BLACK, Color},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerCount {
    Auto,
    Manual(NonZeroUsize),
}

impl WorkerCount {
    pub fn get(&self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get(),
            WorkerCount::Manual(num) => num.get(),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub worker_count: WorkerCount,
    /// Recursion limit for mirror and transparency rays, deeper rays are black.
    pub max_depth: u32,
    /// Weight of the mirrored color against the surface's own color.
    pub reflection_ratio: FloatType,
    pub background: Color,
    /// Base seed of the random draws used for dithered transparency.
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            worker_count: WorkerCount::Auto,
            max_depth: 10,
            reflection_ratio: 0.8,
            background: BLACK,
            seed: 0,
        }
    }
}

/// Number of finished and total rows, reported after every row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderProgress {
    pub finished: usize,
    pub total: usize,
}

impl RenderProgress {
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            100.0 * (self.finished as f32) / (self.total as f32)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished >= self.total
    }
}
