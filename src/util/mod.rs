mod stats;

pub use stats::Stats;

pub type Color = rgb::RGB<f32>;

pub const BLACK: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
};
pub const WHITE: Color = Color {
    r: 1.0,
    g: 1.0,
    b: 1.0,
};

/// Componentwise product of two colors.
pub fn modulate(a: Color, b: Color) -> Color {
    Color::new(a.r * b.r, a.g * b.g, a.b * b.b)
}

/// Linear blend, `weight` is the share of `a`.
pub fn blend(a: Color, b: Color, weight: f32) -> Color {
    a * weight + b * (1.0 - weight)
}

/// Maps a 0-1 f32 rgb pixel to an opaque pixel type compatible with module image.
pub fn color_to_image(color: Color) -> image::Rgba<u8> {
    image::Rgba([
        (color.r * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.g * 255.0).round().clamp(0.0, 255.0) as u8,
        (color.b * 255.0).round().clamp(0.0, 255.0) as u8,
        255,
    ])
}
