use image::RgbaImage;
use rand::{Rng as _, SeedableRng, rngs::SmallRng};
use rand_distr::Open01;

use crate::{
    camera::Camera,
    geometry::{EPSILON, FloatType, Ray, ScreenPoint, reflect},
    material::{Material, MaterialTable},
    renderer::RenderSettings,
    scene::{HitRecord, PointLight, Scene, Surface},
    util::{BLACK, Color, blend, color_to_image, modulate},
};

/// Decorrelates the per row seeds.
const ROW_SEED_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Per thread tracing state.
pub struct Worker<'a> {
    scene: &'a Scene,
    camera: &'a Camera,
    materials: &'a MaterialTable,
    settings: &'a RenderSettings,
    rng: SmallRng,
}

impl<'a> Worker<'a> {
    pub fn new(
        scene: &'a Scene,
        camera: &'a Camera,
        materials: &'a MaterialTable,
        settings: &'a RenderSettings,
    ) -> Self {
        Worker {
            scene,
            camera,
            materials,
            settings,
            rng: SmallRng::seed_from_u64(settings.seed),
        }
    }

    /// Traces one pixel row into a buffer one pixel high.
    pub fn render_row(&mut self, row: u32, buffer: &mut RgbaImage) {
        // Random draws depend only on the row, not on which worker claimed it
        self.rng = SmallRng::seed_from_u64(
            self.settings.seed ^ (row as u64).wrapping_mul(ROW_SEED_MULTIPLIER),
        );

        for x in 0..buffer.width() {
            let ray = self.camera.ray_for_pixel(&ScreenPoint::new(x, row));
            let color = self.trace(&ray, 0);
            buffer.put_pixel(x, 0, color_to_image(color));
        }
    }

    fn trace(&mut self, ray: &Ray, depth: u32) -> Color {
        if depth >= self.settings.max_depth {
            return BLACK;
        }
        let Some(hit) = self.scene.hit(ray, EPSILON, FloatType::INFINITY) else {
            return self.settings.background;
        };
        let materials = self.materials;
        let Some(material) = materials.get(hit.material) else {
            return self.settings.background;
        };

        let base = material.surface_color(&hit.point, &hit.texture_coordinates);
        let mut color = modulate(base, self.scene.ambient.radiance());
        for light in self.scene.lights().iter() {
            color = color + self.direct_light(ray, &hit, material, base, light);
        }

        if material.mirror {
            let reflected = Ray::new(
                hit.point + hit.normal.as_ref() * EPSILON,
                reflect(&ray.direction, &hit.normal),
            );
            let reflection = self.trace(&reflected, depth + 1);
            color = blend(reflection, color, self.settings.reflection_ratio);
        }

        let alpha = self.alpha(material, &hit);
        if alpha < 1.0 {
            let behind = self.trace(&Ray::new(hit.point, ray.direction), depth + 1);
            color = blend(color, behind, alpha);
        }

        color
    }

    /// Diffuse and specular contribution of a single light, zero when shadowed.
    fn direct_light(
        &self,
        ray: &Ray,
        hit: &HitRecord,
        material: &Material,
        base: Color,
        light: &PointLight,
    ) -> Color {
        if let Some(spotlight) = &light.spotlight {
            if !spotlight.illuminates(&(hit.point - light.position)) {
                return BLACK;
            }
        }

        let to_light = light.position - hit.point;
        let distance = to_light.norm();
        if distance == 0.0 {
            return BLACK;
        }
        let direction = to_light / distance;
        let n_dot_l = hit.normal.dot(&direction);
        if n_dot_l <= 0.0 || self.in_shadow(hit, light, distance) {
            return BLACK;
        }

        let radiance = light.radiance();
        let diffuse = modulate(base, radiance) * n_dot_l;

        let mirrored = reflect(&-direction, &hit.normal);
        let specular_angle = mirrored.dot(&-ray.direction).max(0.0);
        let specular = material.specular_coefficient
            * specular_angle.powf(material.specular_exponent);

        diffuse + radiance * specular
    }

    fn in_shadow(&self, hit: &HitRecord, light: &PointLight, distance: FloatType) -> bool {
        let shadow_ray = Ray::new(
            hit.point + hit.normal.as_ref() * EPSILON,
            light.position - hit.point,
        );
        self.scene
            .hit_filtered(&shadow_ray, EPSILON, distance - EPSILON, |surface| {
                self.occludes(surface, light)
            })
            .is_some()
    }

    fn occludes(&self, surface: &Surface, light: &PointLight) -> bool {
        !surface.shape.is_beam()
            && !light.ignores(surface.id)
            && surface.casts_shadow
            && (surface.blocks_light
                || self
                    .materials
                    .get(surface.material)
                    .is_some_and(|material| material.is_opaque()))
    }

    /// Beams fade towards the end of their chain and get dithered per sample.
    fn alpha(&mut self, material: &Material, hit: &HitRecord) -> FloatType {
        if material.random_alpha {
            let dither: FloatType = self.rng.sample(Open01);
            material.alpha * (1.0 - hit.beam_ratio) * dither
        } else {
            material.alpha
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geometry::{ScreenSize, WorldPoint, WorldVector},
        material::MaterialId,
        scene::{
            Ambient, Beam, ObjectId, Shape, Spotlight,
            primitives::{Plane, Sphere},
        },
        util::WHITE,
    };
    use assert2::assert;

    fn camera() -> Camera {
        Camera::builder()
            .position(WorldPoint::origin())
            .forward(WorldVector::x())
            .up(WorldVector::y())
            .resolution(ScreenSize::new(2, 2))
            .build()
            .unwrap()
    }

    fn white_materials() -> MaterialTable {
        let mut materials = MaterialTable::new();
        materials.push(Material::builder().color(WHITE).build());
        materials
    }

    fn floor() -> Surface {
        Surface::builder()
            .shape(Shape::Plane(Plane::new(WorldPoint::origin(), WorldVector::y_axis())))
            .material(MaterialId::new(0))
            .build()
    }

    /// White floor lit from above, with one extra surface between them.
    fn lit_floor(blocker: Surface, light: PointLight, materials: &MaterialTable) -> Scene {
        let mut scene = Scene::new(Ambient {
            color: WHITE,
            intensity: 0.0,
        });
        scene.add_surface(floor(), materials).unwrap();
        scene.add_surface(blocker, materials).unwrap();
        scene.add_light(light).unwrap();
        scene.refresh(materials);
        scene
    }

    fn blocker() -> Surface {
        Surface::builder()
            .shape(Shape::Sphere(Sphere::new(WorldPoint::new(0.0, 2.0, 0.0), 0.5)))
            .material(MaterialId::new(0))
            .build()
    }

    fn overhead_light() -> PointLight {
        PointLight::builder().position(WorldPoint::new(0.0, 5.0, 0.0)).build()
    }

    fn down_from(x: FloatType) -> Ray {
        Ray::new(WorldPoint::new(x, 1.0, 0.0), -WorldVector::y())
    }

    fn trace(scene: &Scene, materials: &MaterialTable, settings: &RenderSettings, ray: &Ray) -> Color {
        let camera = camera();
        Worker::new(scene, &camera, materials, settings).trace(ray, 0)
    }

    #[test]
    fn miss_gives_background() {
        let settings = RenderSettings {
            background: Color::new(0.1, 0.2, 0.3),
            ..RenderSettings::default()
        };
        let scene = Scene::new(Ambient::default());
        let color = trace(&scene, &white_materials(), &settings, &down_from(0.0));
        assert!(color == Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn depth_limit_gives_black() {
        let settings = RenderSettings {
            max_depth: 0,
            background: WHITE,
            ..RenderSettings::default()
        };
        let scene = Scene::new(Ambient::default());
        assert!(trace(&scene, &white_materials(), &settings, &down_from(0.0)) == BLACK);
    }

    #[test]
    fn blocker_casts_shadow() {
        let materials = white_materials();
        let scene = lit_floor(blocker(), overhead_light(), &materials);
        let settings = RenderSettings::default();

        assert!(trace(&scene, &materials, &settings, &down_from(0.0)) == BLACK);
        let lit = trace(&scene, &materials, &settings, &down_from(3.0));
        assert!(lit.r > 0.1);
    }

    #[test]
    fn ignored_surfaces_do_not_shadow() {
        let materials = white_materials();
        let light = PointLight::builder()
            .position(WorldPoint::new(0.0, 5.0, 0.0))
            .ignore(vec![ObjectId::new(1)])
            .build();
        let scene = lit_floor(blocker(), light, &materials);

        let color = trace(&scene, &materials, &RenderSettings::default(), &down_from(0.0));
        assert!(color.r > 0.9);
    }

    #[test]
    fn beams_do_not_shadow() {
        let materials = white_materials();
        let beam = Surface::builder()
            .shape(Shape::Beam(Beam::new(
                WorldPoint::new(-2.0, 2.0, 0.0),
                WorldVector::x_axis(),
                4.0,
                0.3,
            )))
            .material(MaterialId::new(0))
            .build();
        let scene = lit_floor(beam, overhead_light(), &materials);

        let color = trace(&scene, &materials, &RenderSettings::default(), &down_from(0.0));
        assert!(color.r > 0.9);
    }

    #[test]
    fn spotlight_only_lights_its_cone() {
        let materials = white_materials();
        let spot = |direction| {
            PointLight::builder()
                .position(WorldPoint::new(0.0, 5.0, 0.0))
                .spotlight(Spotlight {
                    direction,
                    cutoff_cos: 0.9,
                    range: 10.0,
                })
                .build()
        };
        let away = Surface::builder()
            .shape(Shape::Sphere(Sphere::new(WorldPoint::new(10.0, 2.0, 0.0), 0.5)))
            .material(MaterialId::new(0))
            .build();

        let upwards = lit_floor(away.clone(), spot(WorldVector::y_axis()), &materials);
        let downwards = lit_floor(away, spot(-WorldVector::y_axis()), &materials);
        let settings = RenderSettings::default();

        assert!(trace(&upwards, &materials, &settings, &down_from(0.0)) == BLACK);
        assert!(trace(&downwards, &materials, &settings, &down_from(0.0)).r > 0.9);
        // Outside the cone
        assert!(trace(&downwards, &materials, &settings, &down_from(4.0)) == BLACK);
    }

    #[test]
    fn mirror_blends_in_the_reflection() {
        let mut materials = MaterialTable::new();
        materials.push(Material::builder().color(BLACK).mirror(true).build());
        let mut scene = Scene::new(Ambient::default());
        scene.add_surface(floor(), &materials).unwrap();
        scene.refresh(&materials);

        let settings = RenderSettings {
            background: WHITE,
            ..RenderSettings::default()
        };
        let ray = Ray::new(WorldPoint::new(-1.0, 1.0, 0.0), WorldVector::new(1.0, -1.0, 0.0));
        let color = trace(&scene, &materials, &settings, &ray);
        assert!(color == Color::new(0.8, 0.8, 0.8));
    }

    #[test]
    fn half_transparent_glass() {
        let mut materials = MaterialTable::new();
        materials.push(Material::builder().color(WHITE).alpha(0.5).build());
        let mut scene = Scene::new(Ambient {
            color: WHITE,
            intensity: 1.0,
        });
        scene.add_surface(floor(), &materials).unwrap();
        scene.refresh(&materials);

        let color = trace(&scene, &materials, &RenderSettings::default(), &down_from(0.0));
        assert!(color == Color::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn rows_do_not_depend_on_earlier_rows() {
        let mut materials = MaterialTable::new();
        materials.push(
            Material::builder()
                .color(WHITE)
                .alpha(0.8)
                .random_alpha(true)
                .build(),
        );
        let mut scene = Scene::new(Ambient::default());
        scene.add_surface(
            Surface::builder()
                .shape(Shape::Plane(Plane::new(
                    WorldPoint::new(3.0, 0.0, 0.0),
                    -WorldVector::x_axis(),
                )))
                .material(MaterialId::new(0))
                .build(),
            &materials,
        )
        .unwrap();
        scene.refresh(&materials);

        let camera = camera();
        let settings = RenderSettings::default();
        let mut buffer = RgbaImage::new(2, 1);

        let mut fresh = Worker::new(&scene, &camera, &materials, &settings);
        fresh.render_row(1, &mut buffer);
        let expected = buffer.clone();

        let mut used = Worker::new(&scene, &camera, &materials, &settings);
        used.render_row(0, &mut buffer);
        used.render_row(1, &mut buffer);
        assert!(buffer == expected);
    }
}
