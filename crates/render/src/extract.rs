use glam::{Mat4, Vec3};
use haunted_common::{GeometryHandle, MaterialHandle, NodeId};
use haunted_scene::{LightKind, NodeKind, Scene, SceneError};

/// A directional light resolved to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLightData {
    /// Unit vector the light travels along.
    pub direction: Vec3,
    /// Linear color times intensity.
    pub radiance: [f32; 3],
}

/// One mesh to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub model: Mat4,
    pub transparent: bool,
    /// View-space distance from the camera, used to order blended draws.
    pub depth: f32,
}

/// Everything a backend needs to draw one frame, flattened out of the
/// scene graph. Opaque draws come first in traversal order, then
/// transparent draws sorted back to front.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    /// Sum of every ambient light's radiance.
    pub ambient: [f32; 3],
    pub directional: Vec<DirectionalLightData>,
    pub draws: Vec<DrawItem>,
}

impl FrameSnapshot {
    /// Flatten `scene` as seen from the camera node `camera`.
    pub fn extract(scene: &Scene, camera: NodeId) -> Result<Self, SceneError> {
        let projection = scene.camera(camera)?.projection_matrix();
        let camera_world = scene.world_matrix(camera)?;
        let view = camera_world.inverse();
        let camera_position = camera_world.transform_point3(Vec3::ZERO);

        let mut ambient = [0.0f32; 3];
        let mut directional = Vec::new();
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();

        for (id, node, world) in scene.traverse() {
            match &node.kind {
                NodeKind::Mesh(mesh) => {
                    let material = scene
                        .material(mesh.material)
                        .ok_or(SceneError::UnknownMaterial(mesh.material))?;
                    let depth = -view.transform_point3(world.transform_point3(Vec3::ZERO)).z;
                    let item = DrawItem {
                        node: id,
                        geometry: mesh.geometry,
                        material: mesh.material,
                        model: world,
                        transparent: material.transparent,
                        depth,
                    };
                    if material.transparent {
                        transparent.push(item);
                    } else {
                        opaque.push(item);
                    }
                }
                NodeKind::Light(light) => match light.kind {
                    LightKind::Ambient => {
                        for (sum, c) in ambient.iter_mut().zip(light.radiance()) {
                            *sum += c;
                        }
                    }
                    LightKind::Directional => {
                        let from = world.transform_point3(Vec3::ZERO);
                        let direction = (-from).try_normalize().unwrap_or(Vec3::NEG_Y);
                        directional.push(DirectionalLightData {
                            direction,
                            radiance: light.radiance(),
                        });
                    }
                },
                NodeKind::Root | NodeKind::Group | NodeKind::Camera(_) => {}
            }
        }

        transparent.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        opaque.extend(transparent);

        Ok(Self {
            view,
            projection,
            camera_position,
            ambient,
            directional,
            draws: opaque,
        })
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn opaque_count(&self) -> usize {
        self.draws.iter().filter(|d| !d.transparent).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunted_common::{Color, Transform};
    use haunted_house::{HouseOptions, build_haunted_house};
    use haunted_scene::{Geometry, Light, Material, PerspectiveCamera};

    fn house_scene(options: &HouseOptions) -> (Scene, haunted_house::HauntedHouse) {
        let mut scene = Scene::new();
        let house = build_haunted_house(&mut scene, None, 16.0 / 9.0, options).unwrap();
        (scene, house)
    }

    #[test]
    fn house_scene_draws_every_mesh() {
        let (scene, house) = house_scene(&HouseOptions::default());
        let snapshot = FrameSnapshot::extract(&scene, house.camera).unwrap();
        // walls, roof, door, four bushes, floor
        assert_eq!(snapshot.draws.len(), 8);
        assert_eq!(snapshot.opaque_count(), 8);
        assert_eq!(snapshot.directional.len(), 1);
        assert!(snapshot.camera_position.abs_diff_eq(Vec3::new(4.0, 2.0, 5.0), 1e-5));
    }

    #[test]
    fn ambient_tracks_light_intensity() {
        let (mut scene, house) = house_scene(&HouseOptions::default());
        scene.light_mut(house.ambient_light).unwrap().intensity = 1.0;
        let bright = FrameSnapshot::extract(&scene, house.camera).unwrap().ambient;
        scene.light_mut(house.ambient_light).unwrap().intensity = 0.0;
        let dark = FrameSnapshot::extract(&scene, house.camera).unwrap().ambient;
        assert_eq!(dark, [0.0, 0.0, 0.0]);
        assert!(bright.iter().all(|c| *c > 0.0));
    }

    #[test]
    fn moon_shines_toward_origin() {
        let (scene, house) = house_scene(&HouseOptions::default());
        let snapshot = FrameSnapshot::extract(&scene, house.camera).unwrap();
        let moon = scene.world_position(house.moon_light).unwrap();
        let light = snapshot.directional[0];
        assert!(light.direction.abs_diff_eq(-moon.normalize(), 1e-5));
    }

    #[test]
    fn transparent_draws_follow_opaque_back_to_front() {
        let mut scene = Scene::new();
        let root = scene.root();
        let g = scene.add_geometry(Geometry::Plane {
            width: 1.0,
            height: 1.0,
        });
        let solid = scene.add_material(Material::standard("solid", Color::WHITE));
        let glass = scene.add_material(Material::standard("glass", Color::WHITE).transparent());
        let near = scene
            .add_mesh(root, "near", g, glass, Transform::from_position(Vec3::new(0.0, 0.0, -1.0)))
            .unwrap();
        let far = scene
            .add_mesh(root, "far", g, glass, Transform::from_position(Vec3::new(0.0, 0.0, -5.0)))
            .unwrap();
        let wall = scene
            .add_mesh(root, "wall", g, solid, Transform::from_position(Vec3::new(0.0, 0.0, -9.0)))
            .unwrap();
        let camera = scene
            .insert(
                root,
                "camera",
                NodeKind::Camera(PerspectiveCamera::default()),
                Transform::default(),
            )
            .unwrap();

        let snapshot = FrameSnapshot::extract(&scene, camera).unwrap();
        let order: Vec<NodeId> = snapshot.draws.iter().map(|d| d.node).collect();
        assert_eq!(order, vec![wall, far, near]);
        assert!((snapshot.draws[1].depth - 5.0).abs() < 1e-5);
    }

    #[test]
    fn extract_requires_a_camera_node() {
        let mut scene = Scene::new();
        let root = scene.root();
        let light = scene
            .insert(
                root,
                "ambient",
                NodeKind::Light(Light::ambient(Color::WHITE, 0.5)),
                Transform::default(),
            )
            .unwrap();
        assert!(matches!(
            FrameSnapshot::extract(&scene, light),
            Err(SceneError::WrongKind { .. })
        ));
    }

    #[test]
    fn view_projection_maps_target_to_screen_center() {
        let (scene, house) = house_scene(&HouseOptions::default());
        let snapshot = FrameSnapshot::extract(&scene, house.camera).unwrap();
        let clip = snapshot.view_projection().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
    }
}
