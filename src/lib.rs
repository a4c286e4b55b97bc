pub mod camera;
pub mod collision;
pub mod demo;
pub mod geometry;
pub mod material;
mod renderer;
pub mod scene;
pub mod session;
pub mod util;

pub use crate::renderer::{RenderProgress, RenderSettings, WorkerCount, render};
pub use camera::Camera;
pub use scene::Scene;
pub use session::Session;
