use std::path::PathBuf;

use beamtrace::{
    RenderSettings, demo,
    geometry::ScreenSize,
    render,
};
use indicatif::ProgressBar;
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let demo = demo::build(ScreenSize::new(1280, 960))?;
    let settings = RenderSettings {
        seed: 1,
        ..RenderSettings::default()
    };

    let bar = ProgressBar::no_length();
    let image = render(&demo.scene, &demo.camera, &demo.materials, &settings, {
        let bar = bar.clone();
        move |progress| {
            bar.update(|ps| {
                ps.set_len(progress.total as u64);
                ps.set_pos(progress.finished as u64)
            })
        }
    })?;
    bar.finish();

    let path = PathBuf::from("beamtrace.png");
    image.save(&path)?;
    info!("Saved {}", path.display());

    Ok(())
}
