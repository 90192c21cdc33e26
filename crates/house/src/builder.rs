use crate::graves::{GraveOptions, place_graves};
use glam::Vec3;
use haunted_assets::{TextureLoader, TextureMaps, TextureSet};
use haunted_common::{Color, NodeId, Transform};
use haunted_scene::{Geometry, Light, Material, Mesh, NodeKind, PerspectiveCamera, Scene, SceneError};
use std::f32::consts::PI;

const WALL_HEIGHT: f32 = 2.5;
const ROOF_HEIGHT: f32 = 1.5;
const DOOR_HEIGHT: f32 = 1.0;
const DOOR_DEPTH: f32 = 0.1;

/// Bush scale and position, front of the house.
const BUSHES: [(f32, [f32; 3]); 4] = [
    (0.5, [0.8, 0.2, 2.2]),
    (0.25, [1.4, 0.1, 2.1]),
    (0.4, [-0.8, 0.1, 2.2]),
    (0.15, [-1.0, 0.05, 2.6]),
];

/// Optional extensions. All off by default, which reproduces the plain
/// scene: brick walls, flat-colored door and floor, no graves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HouseOptions {
    pub textured_door: bool,
    pub textured_grass: bool,
    pub graves: Option<GraveOptions>,
}

/// Ids of the nodes the rest of the application needs after building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HauntedHouse {
    pub house: NodeId,
    pub walls: NodeId,
    pub roof: NodeId,
    pub door: NodeId,
    pub bushes: [NodeId; 4],
    pub graves: NodeId,
    pub floor: NodeId,
    pub ambient_light: NodeId,
    pub moon_light: NodeId,
    pub camera: NodeId,
}

/// Populate `scene` with the haunted house.
///
/// `textures` is the asset loader; pass `None` to build with flat colors
/// only (headless tools). Texture files that fail to load are logged and
/// skipped, never fatal.
pub fn build_haunted_house(
    scene: &mut Scene,
    mut textures: Option<&mut TextureLoader>,
    aspect: f32,
    options: &HouseOptions,
) -> Result<HauntedHouse, SceneError> {
    let root = scene.root();
    let mut load_set = |set: &TextureSet| {
        textures
            .as_deref_mut()
            .map(|loader| loader.load_set(set))
            .unwrap_or_default()
    };

    // House
    let house = scene.add_group(root, "house", Transform::default())?;

    let walls_geometry = scene.add_geometry(Geometry::Box {
        width: 4.0,
        height: WALL_HEIGHT,
        depth: 4.0,
    });
    let walls_material = scene.add_material(
        Material::standard("walls", Color::hex(0xac8e82)).with_maps(load_set(&TextureSet::BRICKS)),
    );
    let walls = scene.add_mesh(
        house,
        "walls",
        walls_geometry,
        walls_material,
        Transform::from_position(Vec3::new(0.0, WALL_HEIGHT / 2.0, 0.0)),
    )?;

    let roof_geometry = scene.add_geometry(Geometry::Cone {
        radius: 3.5,
        height: ROOF_HEIGHT,
        radial_segments: 4,
    });
    let roof_material = scene.add_material(Material::standard("roof", Color::hex(0xb35f45)));
    let roof = scene.add_mesh(
        house,
        "roof",
        roof_geometry,
        roof_material,
        Transform::from_position(Vec3::new(0.0, WALL_HEIGHT + ROOF_HEIGHT / 2.0, 0.0))
            .with_euler(0.0, PI * 0.25, 0.0),
    )?;

    let door_geometry = scene.add_geometry(Geometry::Box {
        width: 0.8,
        height: DOOR_HEIGHT,
        depth: DOOR_DEPTH,
    });
    let mut door_material = Material::standard("door", Color::hex(0xaa7b7b));
    if options.textured_door {
        door_material = door_material
            .with_maps(load_set(&TextureSet::DOOR))
            .transparent();
    }
    let door_material = scene.add_material(door_material);
    let door = scene.add_mesh(
        house,
        "door",
        door_geometry,
        door_material,
        Transform::from_position(Vec3::new(0.0, DOOR_HEIGHT / 2.0, 2.0 + DOOR_DEPTH / 2.0)),
    )?;

    let bush_geometry = scene.add_geometry(Geometry::Sphere {
        radius: 1.0,
        width_segments: 16,
        height_segments: 16,
    });
    let bush_material = scene.add_material(Material::standard("bush", Color::hex(0x89c854)));
    let mut bushes = [root; 4];
    for (i, (scale, [x, y, z])) in BUSHES.into_iter().enumerate() {
        bushes[i] = scene.add_mesh(
            house,
            format!("bush{}", i + 1),
            bush_geometry,
            bush_material,
            Transform::from_position(Vec3::new(x, y, z)).with_scale(scale),
        )?;
    }

    // Graves
    let graves = scene.add_group(root, "graves", Transform::default())?;
    let grave_geometry = scene.add_geometry(Geometry::Box {
        width: 0.6,
        height: 0.8,
        depth: 0.2,
    });
    let grave_material = scene.add_material(Material::standard("grave", Color::hex(0xb2b6b1)));
    if let Some(grave_options) = options.graves {
        for (i, placement) in place_graves(grave_options).into_iter().enumerate() {
            let mesh = Mesh {
                geometry: grave_geometry,
                material: grave_material,
                cast_shadow: true,
            };
            scene.insert(
                graves,
                format!("grave{}", i + 1),
                NodeKind::Mesh(mesh),
                Transform::from_position(placement.position).with_euler(
                    0.0,
                    placement.rotation_y,
                    placement.rotation_z,
                ),
            )?;
        }
    }

    // Floor
    let floor_geometry = scene.add_geometry(Geometry::Plane {
        width: 20.0,
        height: 20.0,
    });
    let floor_maps = if options.textured_grass {
        load_set(&TextureSet::GRASS)
    } else {
        TextureMaps::default()
    };
    let floor_material = scene.add_material(
        Material::standard("floor", Color::hex(0xa9c388))
            .with_maps(floor_maps)
            .double_sided(),
    );
    let floor = scene.add_mesh(
        root,
        "floor",
        floor_geometry,
        floor_material,
        Transform::from_position(Vec3::new(0.0, -0.001, 0.0)).with_euler(-PI * 0.5, 0.0, 0.0),
    )?;

    // Lights
    let ambient_light = scene.insert(
        root,
        "ambient light",
        NodeKind::Light(Light::ambient(Color::WHITE, 0.5)),
        Transform::default(),
    )?;
    let moon_light = scene.insert(
        root,
        "moon light",
        NodeKind::Light(Light::directional(Color::WHITE, 0.5)),
        Transform::from_position(Vec3::new(4.0, 5.0, -2.0)),
    )?;

    // Camera
    let mut camera_transform = Transform::from_position(Vec3::new(4.0, 2.0, 5.0));
    camera_transform.look_at(Vec3::ZERO);
    let camera = scene.insert(
        root,
        "camera",
        NodeKind::Camera(PerspectiveCamera::new(75.0, aspect, 0.1, 100.0)),
        camera_transform,
    )?;

    tracing::info!(
        "haunted house built: {} nodes, {} geometries, {} materials",
        scene.node_count(),
        scene.geometries().len(),
        scene.materials().len()
    );

    Ok(HauntedHouse {
        house,
        walls,
        roof,
        door,
        bushes,
        graves,
        floor,
        ambient_light,
        moon_light,
        camera,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunted_scene::{LightKind, Side};

    fn build(options: HouseOptions) -> (Scene, HauntedHouse) {
        let mut scene = Scene::new();
        let ids = build_haunted_house(&mut scene, None, 16.0 / 9.0, &options).unwrap();
        (scene, ids)
    }

    #[test]
    fn root_has_six_children_in_order() {
        let (scene, ids) = build(HouseOptions::default());
        assert_eq!(
            scene.children(scene.root()),
            &[
                ids.house,
                ids.graves,
                ids.floor,
                ids.ambient_light,
                ids.moon_light,
                ids.camera
            ]
        );
    }

    #[test]
    fn house_contents_and_bush_scales() {
        let (scene, ids) = build(HouseOptions::default());
        let children = scene.children(ids.house);
        assert_eq!(children.len(), 7);
        assert_eq!(&children[..3], &[ids.walls, ids.roof, ids.door]);
        assert_eq!(&children[3..], &ids.bushes);

        let scales: Vec<f32> = ids
            .bushes
            .iter()
            .map(|id| scene.transform(*id).unwrap().scale.x)
            .collect();
        assert_eq!(scales, vec![0.5, 0.25, 0.4, 0.15]);
        for id in ids.bushes {
            let s = scene.transform(id).unwrap().scale;
            assert_eq!(s.x, s.y);
            assert_eq!(s.y, s.z);
        }
    }

    #[test]
    fn bushes_share_geometry_and_material() {
        let (scene, ids) = build(HouseOptions::default());
        let meshes: Vec<_> = ids
            .bushes
            .iter()
            .map(|id| match scene.get(*id).unwrap().kind {
                NodeKind::Mesh(m) => (m.geometry, m.material),
                _ => panic!("bush is not a mesh"),
            })
            .collect();
        assert!(meshes.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn graves_group_empty_by_default() {
        let (scene, ids) = build(HouseOptions::default());
        assert!(scene.children(ids.graves).is_empty());
    }

    #[test]
    fn graves_extension_scatters_meshes() {
        let (scene, ids) = build(HouseOptions {
            graves: Some(GraveOptions { count: 50, seed: 1 }),
            ..HouseOptions::default()
        });
        let graves = scene.children(ids.graves);
        assert_eq!(graves.len(), 50);
        match scene.get(graves[0]).unwrap().kind {
            NodeKind::Mesh(m) => assert!(m.cast_shadow),
            _ => panic!("grave is not a mesh"),
        }
    }

    #[test]
    fn literal_placements() {
        let (scene, ids) = build(HouseOptions::default());
        assert_eq!(scene.transform(ids.walls).unwrap().position.y, 1.25);
        assert_eq!(scene.transform(ids.roof).unwrap().position.y, 3.25);
        let door = scene.transform(ids.door).unwrap().position;
        assert_eq!(door.y, 0.5);
        assert!((door.z - 2.05).abs() < 1e-6);
        assert_eq!(scene.transform(ids.floor).unwrap().position.y, -0.001);
        assert_eq!(
            scene.transform(ids.moon_light).unwrap().position,
            Vec3::new(4.0, 5.0, -2.0)
        );
        assert_eq!(
            scene.transform(ids.camera).unwrap().position,
            Vec3::new(4.0, 2.0, 5.0)
        );
    }

    #[test]
    fn floor_lies_flat_and_double_sided() {
        let (scene, ids) = build(HouseOptions::default());
        let up = scene.transform(ids.floor).unwrap().rotation * Vec3::Z;
        assert!(up.abs_diff_eq(Vec3::Y, 1e-6));
        let NodeKind::Mesh(mesh) = scene.get(ids.floor).unwrap().kind else {
            panic!("floor is not a mesh");
        };
        assert_eq!(scene.material(mesh.material).unwrap().side, Side::Double);
    }

    #[test]
    fn lights_and_camera_parameters() {
        let (scene, ids) = build(HouseOptions::default());
        let ambient = scene.light(ids.ambient_light).unwrap();
        assert_eq!(ambient.kind, LightKind::Ambient);
        assert_eq!(ambient.intensity, 0.5);
        let moon = scene.light(ids.moon_light).unwrap();
        assert_eq!(moon.kind, LightKind::Directional);
        assert_eq!(moon.intensity, 0.5);

        let camera = scene.camera(ids.camera).unwrap();
        assert_eq!((camera.fov, camera.near, camera.far), (75.0, 0.1, 100.0));
        assert_eq!(camera.aspect, 16.0 / 9.0);
    }

    #[test]
    fn building_twice_duplicates() {
        let mut scene = Scene::new();
        let opts = HouseOptions::default();
        build_haunted_house(&mut scene, None, 1.0, &opts).unwrap();
        build_haunted_house(&mut scene, None, 1.0, &opts).unwrap();
        assert_eq!(scene.children(scene.root()).len(), 12);
    }

    #[test]
    fn missing_textures_fall_back_to_flat_color() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = TextureLoader::new(dir.path());
        let mut scene = Scene::new();
        let ids = build_haunted_house(
            &mut scene,
            Some(&mut loader),
            1.0,
            &HouseOptions {
                textured_door: true,
                ..HouseOptions::default()
            },
        )
        .unwrap();
        let NodeKind::Mesh(walls) = scene.get(ids.walls).unwrap().kind else {
            panic!("walls is not a mesh");
        };
        assert!(scene.material(walls.material).unwrap().maps.is_empty());
        let NodeKind::Mesh(door) = scene.get(ids.door).unwrap().kind else {
            panic!("door is not a mesh");
        };
        assert!(scene.material(door.material).unwrap().transparent);
    }
}
