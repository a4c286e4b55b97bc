//! Built-in scene: a beam source whose beam hits a target after one mirror bounce,
//! surrounded by a few props to push around.

use std::f32::consts::FRAC_PI_4;

use crate::{
    camera::Camera,
    geometry::{ScreenSize, WorldPoint, WorldVector},
    material::{Material, MaterialTable},
    scene::{
        Ambient, BeamEmission, BeamSource, BeamTarget, PointLight, Scene, Shape, Surface,
        primitives::{Cone, Cube, Cylinder, Plane, Sphere},
    },
    util::{Color, WHITE},
};

#[derive(Debug)]
pub struct Demo {
    pub scene: Scene,
    pub camera: Camera,
    pub materials: MaterialTable,
}

pub fn build(resolution: ScreenSize) -> anyhow::Result<Demo> {
    let mut materials = MaterialTable::new();
    let floor = materials.push(
        Material::builder()
            .color(Color::new(0.7, 0.7, 0.7))
            .checkered(true)
            .build(),
    );
    let mirror = materials.push(
        Material::builder()
            .color(Color::new(0.1, 0.1, 0.12))
            .specular_coefficient(0.8)
            .specular_exponent(64.0)
            .mirror(true)
            .build(),
    );
    let glass = materials.push(
        Material::builder()
            .color(Color::new(0.6, 0.8, 1.0))
            .alpha(0.35)
            .specular_coefficient(0.9)
            .build(),
    );
    let clay = materials.push(
        Material::builder()
            .color(Color::new(0.8, 0.45, 0.2))
            .specular_coefficient(0.2)
            .build(),
    );
    let shell = materials.push(
        Material::builder()
            .color(Color::new(0.3, 0.3, 0.35))
            .alpha(0.4)
            .build(),
    );
    let core = materials.push(Material::builder().color(Color::new(1.0, 0.9, 0.3)).build());
    let flash = materials.push(Material::builder().color(Color::new(0.2, 0.8, 0.3)).build());
    let glow = materials.push(
        Material::builder()
            .color(Color::new(1.0, 0.3, 0.2))
            .alpha(0.7)
            .random_alpha(true)
            .build(),
    );

    let mut mirror_cube = Surface::builder()
        .shape(Shape::Cube(Cube::new(WorldPoint::new(2.0, 1.0, 0.0), 1.0)))
        .material(mirror)
        .movable(true)
        .rotatable(true)
        .build();
    mirror_cube.rotate(&WorldVector::y(), FRAC_PI_4);

    let surfaces = [
        Surface::builder()
            .shape(Shape::Plane(Plane::new(WorldPoint::origin(), WorldVector::y_axis())))
            .material(floor)
            .build(),
        Surface::builder()
            .shape(Shape::BeamSource(BeamSource::new(
                WorldPoint::new(-4.0, 1.0, 0.0),
                0.5,
                WorldVector::x_axis(),
                core,
                core,
                BeamEmission {
                    length: 20.0,
                    radius: 0.08,
                    material: glow,
                    intensity: 0.6,
                },
            )))
            .material(shell)
            .rotatable(true)
            .build(),
        mirror_cube,
        Surface::builder()
            .shape(Shape::BeamTarget(BeamTarget::new(
                WorldPoint::new(1.3, 1.0, 4.0),
                0.6,
                flash,
                core,
            )))
            .material(shell)
            .blocks_light(true)
            .build(),
        Surface::builder()
            .shape(Shape::Sphere(Sphere::new(WorldPoint::new(-2.0, 1.05, -3.0), 1.0)))
            .material(glass)
            .movable(true)
            .build(),
        Surface::builder()
            .shape(Shape::Cylinder(Cylinder::new(
                WorldPoint::new(4.5, 1.05, -3.0),
                WorldVector::y_axis(),
                0.6,
                2.0,
            )))
            .material(clay)
            .movable(true)
            .build(),
        Surface::builder()
            .shape(Shape::Cone(Cone::new(
                WorldPoint::new(-3.5, 0.0, 3.5),
                WorldVector::y_axis(),
                0.8,
                1.6,
            )))
            .material(clay)
            .build(),
    ];

    let mut scene = Scene::new(Ambient {
        color: WHITE,
        intensity: 0.15,
    });
    for surface in surfaces {
        scene.add_surface(surface, &materials)?;
    }
    scene.add_light(
        PointLight::builder()
            .position(WorldPoint::new(2.0, 8.0, 6.0))
            .intensity(0.9)
            .build(),
    )?;
    scene.score.target_required = 1;
    scene.refresh(&materials);

    let camera = Camera::builder()
        .position(WorldPoint::new(0.0, 4.0, 10.0))
        .forward(WorldVector::new(0.0, -0.35, -1.0))
        .up(WorldVector::y())
        .resolution(resolution)
        .build()?;

    Ok(Demo {
        scene,
        camera,
        materials,
    })
}
