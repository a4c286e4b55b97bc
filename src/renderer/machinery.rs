use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Instant,
};

use anyhow::anyhow;
use image::{GenericImage as _, RgbaImage};
use log::{debug, info};

use crate::{
    camera::Camera,
    material::MaterialTable,
    renderer::{RenderProgress, RenderSettings, worker::Worker},
    scene::Scene,
};

/// Renders one frame.
///
/// Workers claim whole rows from a shared cursor until the image is exhausted.
/// The scene is only read, `on_row` gets called from the workers after every row.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    materials: &MaterialTable,
    settings: &RenderSettings,
    on_row: impl Fn(RenderProgress) + Sync,
) -> anyhow::Result<RgbaImage> {
    let started = Instant::now();
    let resolution = camera.get_resolution();
    let state = RenderState {
        scene,
        camera,
        materials,
        settings,

        image: Mutex::new(RgbaImage::new(resolution.x, resolution.y)),

        row_count: resolution.y as usize,
        next_row: AtomicUsize::new(0),
        finished_rows: AtomicUsize::new(0),
    };

    let worker_count = settings.worker_count.get().clamp(1, state.row_count.max(1));
    let cores = core_affinity::get_core_ids().unwrap_or_default();
    debug!("Rendering with {worker_count} workers on {} cores", cores.len());

    thread::scope(|scope| -> anyhow::Result<()> {
        let handles = (0..worker_count)
            .map(|worker_id| {
                let state = &state;
                let on_row = &on_row;
                let core = (!cores.is_empty()).then(|| cores[worker_id % cores.len()]);

                thread::Builder::new()
                    .name(format!("worker{worker_id}"))
                    .spawn_scoped(scope, move || -> anyhow::Result<()> {
                        if let Some(core) = core {
                            core_affinity::set_for_current(core);
                        }

                        let mut worker =
                            Worker::new(state.scene, state.camera, state.materials, state.settings);
                        let mut buffer = RgbaImage::new(resolution.x, 1);

                        while let Some(row) = state.get_next_row() {
                            worker.render_row(row, &mut buffer);
                            state
                                .image
                                .lock()
                                .map_err(|_| anyhow!("Poisoned image lock"))?
                                .copy_from(&buffer, 0, row)?;

                            on_row(state.finish_row());
                        }
                        Ok(())
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow!("Render worker panicked"))??;
        }
        Ok(())
    })?;

    info!(
        "Rendered {}x{} in {:.1?}",
        resolution.x,
        resolution.y,
        started.elapsed()
    );
    state
        .image
        .into_inner()
        .map_err(|_| anyhow!("Poisoned image lock"))
}

struct RenderState<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    materials: &'a MaterialTable,
    settings: &'a RenderSettings,

    image: Mutex<RgbaImage>,

    row_count: usize,
    next_row: AtomicUsize,
    finished_rows: AtomicUsize,
}

impl RenderState<'_> {
    fn get_next_row(&self) -> Option<u32> {
        let row = self.next_row.fetch_add(1, Ordering::AcqRel);
        (row < self.row_count).then_some(row as u32)
    }

    fn finish_row(&self) -> RenderProgress {
        let finished = self.finished_rows.fetch_add(1, Ordering::AcqRel) + 1;
        RenderProgress {
            finished,
            total: self.row_count,
        }
    }
}
