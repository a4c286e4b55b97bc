use std::{fmt, sync::Arc};

use bon::bon;
use index_vec::IndexVec;

use crate::{
    geometry::{FloatType, TexturePoint, WorldPoint},
    util::{Color, modulate},
};

index_vec::define_index_type! {
    /// Index into the material table.
    pub struct MaterialId = u32;
}

pub type MaterialTable = IndexVec<MaterialId, Material>;

/// Color source sampled at texture coordinates of a hit.
pub trait Texture: Send + Sync + fmt::Debug {
    fn sample(&self, uv: &TexturePoint) -> Color;
}

/// Texture backed by an image, repeating in both directions.
#[derive(Clone, Debug)]
pub struct ImageTexture {
    image: image::RgbImage,
}

impl ImageTexture {
    pub fn new(image: image::RgbImage) -> Self {
        ImageTexture { image }
    }
}

impl Texture for ImageTexture {
    fn sample(&self, uv: &TexturePoint) -> Color {
        let (width, height) = self.image.dimensions();
        if width == 0 || height == 0 {
            return Color::new(0.0, 0.0, 0.0);
        }
        let u = uv.x.rem_euclid(1.0);
        let v = 1.0 - uv.y.rem_euclid(1.0);
        let x = ((u * width as FloatType) as u32).min(width - 1);
        let y = ((v * height as FloatType) as u32).min(height - 1);
        let image::Rgb([r, g, b]) = *self.image.get_pixel(x, y);
        Color::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }
}

#[derive(Clone, Debug)]
pub struct Material {
    /// Color as declared by the scene, never modified.
    pub base_color: Color,
    /// Color used for shading, effects may change it temporarily.
    pub color: Color,
    pub alpha: FloatType,
    pub specular_exponent: FloatType,
    pub specular_coefficient: FloatType,
    pub mirror: bool,
    pub checkered: bool,
    pub texture: Option<Arc<dyn Texture>>,
    /// Alpha gets faded along beams and dithered per sample.
    pub random_alpha: bool,
}

#[bon]
impl Material {
    #[builder]
    pub fn new(
        color: Color,
        #[builder(default = 1.0)] alpha: FloatType,
        #[builder(default = 32.0)] specular_exponent: FloatType,
        #[builder(default = 0.0)] specular_coefficient: FloatType,
        #[builder(default)] mirror: bool,
        #[builder(default)] checkered: bool,
        texture: Option<Arc<dyn Texture>>,
        #[builder(default)] random_alpha: bool,
    ) -> Self {
        Material {
            base_color: color,
            color,
            alpha: alpha.clamp(0.0, 1.0),
            specular_exponent,
            specular_coefficient,
            mirror,
            checkered,
            texture,
            random_alpha,
        }
    }
}

impl Material {
    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }

    /// Surface color at a hit, combining texture, checker pattern and the current color.
    pub fn surface_color(&self, point: &WorldPoint, uv: &TexturePoint) -> Color {
        let color = match &self.texture {
            Some(texture) => modulate(texture.sample(uv), self.color),
            None => self.color,
        };

        if self.checkered && checker_parity(point) {
            color * CHECKER_DARKENING
        } else {
            color
        }
    }
}

const CHECKER_DARKENING: f32 = 0.5;

/// Alternates on a unit grid in world space.
fn checker_parity(point: &WorldPoint) -> bool {
    let sum = point.x.floor() as i64 + point.y.floor() as i64 + point.z.floor() as i64;
    sum.rem_euclid(2) == 1
}
