use anyhow::anyhow;
use beamtrace::{
    RenderSettings, Session, demo,
    geometry::{ScreenSize, WorldVector},
    session::InputState,
};
use eframe::{App, CreationContext, Frame, egui};
use egui::{CentralPanel, ColorImage, Image, Key, TextureOptions, TopBottomPanel};
use log::error;

pub struct BeamtraceGui {
    session: Session,
    texture: egui::TextureHandle,
}

impl BeamtraceGui {
    pub fn new(session: Session, cc: &CreationContext<'_>) -> Self {
        let resolution = session.camera().get_resolution();
        let texture = cc.egui_ctx.load_texture(
            "rendered",
            ColorImage::new(
                [resolution.x as usize, resolution.y as usize],
                egui::Color32::BLACK,
            ),
            TextureOptions::LINEAR,
        );
        BeamtraceGui { session, texture }
    }
}

/// Reads held keys: WASD + R/F move the camera, arrows turn it, IJKL + U/O move
/// the selected object, Q/E turn it and Tab changes the selection.
fn read_input(input: &egui::InputState) -> InputState {
    let axis = |positive: Key, negative: Key| {
        (input.key_down(positive) as i32 - input.key_down(negative) as i32) as f32
    };
    InputState {
        camera_move: WorldVector::new(axis(Key::D, Key::A), axis(Key::R, Key::F), axis(Key::W, Key::S)),
        yaw: axis(Key::ArrowLeft, Key::ArrowRight),
        pitch: axis(Key::ArrowUp, Key::ArrowDown),
        object_move: WorldVector::new(axis(Key::L, Key::J), axis(Key::U, Key::O), axis(Key::K, Key::I)),
        object_turn: axis(Key::Q, Key::E),
        select_next: input.key_pressed(Key::Tab),
    }
}

impl App for BeamtraceGui {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let (dt, input) = ctx.input(|i| (i.stable_dt, read_input(i)));

        match self.session.frame(dt, &input) {
            Ok(image) => {
                let size = [image.width() as usize, image.height() as usize];
                self.texture.set(
                    ColorImage::from_rgba_unmultiplied(size, image.as_raw()),
                    TextureOptions::LINEAR,
                );
            }
            Err(err) => error!("Frame failed: {err:#}"),
        }

        TopBottomPanel::bottom("status").show(ctx, |ui| {
            let score = &self.session.scene().score;
            ui.label(format!(
                "Targets lit: {}/{}{}  Selected: {}",
                score.lit_targets,
                score.target_required,
                if self.session.goal_reached() { " (goal reached)" } else { "" },
                self.session
                    .selected()
                    .map_or_else(|| "none".to_string(), |id| id.index().to_string()),
            ));
        });
        CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.add(Image::from_texture(&self.texture).shrink_to_fit())
            })
        });
        ctx.request_repaint();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    eframe::run_native(
        "Beamtrace",
        Default::default(),
        Box::new(|cc| {
            let demo = demo::build(ScreenSize::new(320, 240))?;
            let session = Session::from_demo(demo, RenderSettings::default());
            Ok(Box::new(BeamtraceGui::new(session, cc)))
        }),
    )
    .map_err(|err| anyhow!("GUI failed: {err}"))
}
