use bytemuck::{Pod, Zeroable};
use haunted_assets::ImageData;
use haunted_render::FrameSnapshot;
use haunted_scene::{Material, MeshData, Side};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub ambient: [f32; 4],
    pub light_direction: [f32; 4],
    pub light_radiance: [f32; 4],
}

impl FrameUniforms {
    /// Only the first directional light is shaded; with none, the light
    /// contributes nothing.
    pub fn from_snapshot(frame: &FrameSnapshot) -> Self {
        let (direction, radiance) = frame
            .directional
            .first()
            .map(|l| (l.direction.extend(0.0).to_array(), l.radiance))
            .unwrap_or(([0.0, -1.0, 0.0, 0.0], [0.0; 3]));
        let p = frame.camera_position;
        let [ar, ag, ab] = frame.ambient;
        let [lr, lg, lb] = radiance;
        Self {
            view_proj: frame.view_projection().to_cols_array_2d(),
            camera_position: [p.x, p.y, p.z, 1.0],
            ambient: [ar, ag, ab, 0.0],
            light_direction: direction,
            light_radiance: [lr, lg, lb, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct MaterialUniforms {
    pub color: [f32; 4],
    pub params: [f32; 4],
}

impl MaterialUniforms {
    pub fn from_material(material: &Material) -> Self {
        let [r, g, b] = material.color.to_linear();
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        Self {
            color: [r, g, b, 1.0],
            params: [
                material.roughness,
                material.metalness,
                flag(material.maps.normal.is_some()),
                flag(material.maps.alpha.is_some()),
            ],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
}

impl InstanceData {
    pub fn from_matrix(model: glam::Mat4) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
        }
    }
}

/// Instance slots allocated up front; the buffer grows past this on demand.
pub(crate) const MIN_INSTANCE_CAPACITY: usize = 1024;

/// Instance buffer slots needed to hold `draws` instances.
pub(crate) fn instance_capacity(draws: usize) -> usize {
    draws.max(MIN_INSTANCE_CAPACITY).next_power_of_two()
}

pub(crate) fn instance_buffer_size(capacity: usize) -> u64 {
    (capacity * std::mem::size_of::<InstanceData>()) as u64
}

/// Interleave tessellated attributes into the vertex layout.
pub(crate) fn mesh_vertices(data: &MeshData) -> Vec<Vertex> {
    data.positions
        .iter()
        .zip(&data.normals)
        .zip(&data.uvs)
        .map(|((position, normal), uv)| Vertex {
            position: *position,
            normal: *normal,
            uv: *uv,
        })
        .collect()
}

/// Which of the three mesh pipelines a material draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipelineKind {
    Opaque,
    OpaqueDoubleSided,
    Transparent,
}

impl PipelineKind {
    pub fn for_material(material: &Material) -> Self {
        if material.transparent {
            Self::Transparent
        } else if material.side == Side::Double {
            Self::OpaqueDoubleSided
        } else {
            Self::Opaque
        }
    }
}

/// What a missing map falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum MapRole {
    Color,
    Normal,
    AmbientOcclusion,
    Roughness,
    Alpha,
}

impl MapRole {
    pub const ALL: [Self; 5] = [
        Self::Color,
        Self::Normal,
        Self::AmbientOcclusion,
        Self::Roughness,
        Self::Alpha,
    ];

    /// Neutral texel: white multiplies through unchanged, and the flat
    /// normal points straight out of the surface.
    pub fn default_texel(self) -> [u8; 4] {
        match self {
            Self::Normal => [128, 128, 255, 255],
            _ => [255, 255, 255, 255],
        }
    }

    /// Color maps hold sRGB-encoded values; every other map is linear data.
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::Color => wgpu::TextureFormat::Rgba8UnormSrgb,
            _ => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// Upload an RGBA8 image as a sampled texture.
pub(crate) fn upload_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &ImageData,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: image.width.max(1),
        height: image.height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};
    use haunted_assets::TextureMaps;
    use haunted_common::{Color, TextureHandle};
    use haunted_render::DirectionalLightData;
    use haunted_scene::Geometry;

    #[test]
    fn gpu_structs_have_expected_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::size_of::<InstanceData>(), 64);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 32);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 128);
    }

    #[test]
    fn instance_capacity_grows_to_fit_every_draw() {
        assert_eq!(instance_capacity(0), MIN_INSTANCE_CAPACITY);
        assert_eq!(instance_capacity(8), MIN_INSTANCE_CAPACITY);
        assert_eq!(instance_capacity(MIN_INSTANCE_CAPACITY), MIN_INSTANCE_CAPACITY);
        assert_eq!(instance_capacity(MIN_INSTANCE_CAPACITY + 1), 2 * MIN_INSTANCE_CAPACITY);
        assert_eq!(instance_capacity(5008), 8192);
        assert_eq!(instance_buffer_size(8192), 8192 * 64);
    }

    #[test]
    fn many_graves_keep_the_door_within_capacity() {
        let mut scene = haunted_scene::Scene::new();
        let options = haunted_house::HouseOptions {
            textured_door: true,
            textured_grass: false,
            graves: Some(haunted_house::GraveOptions {
                count: 5000,
                seed: 7,
            }),
        };
        let house =
            haunted_house::build_haunted_house(&mut scene, None, 16.0 / 9.0, &options).unwrap();
        let frame = haunted_render::FrameSnapshot::extract(&scene, house.camera).unwrap();

        let door = frame
            .draws
            .iter()
            .position(|d| d.node == house.door)
            .unwrap();
        assert!(door < instance_capacity(frame.draws.len()));
        assert!(frame.draws.len() <= instance_capacity(frame.draws.len()));
    }

    #[test]
    fn vertices_interleave_all_attributes() {
        let data = Geometry::Plane {
            width: 2.0,
            height: 2.0,
        }
        .tessellate();
        let vertices = mesh_vertices(&data);
        assert_eq!(vertices.len(), data.vertex_count());
        assert_eq!(vertices[0].position, data.positions[0]);
        assert_eq!(vertices[3].uv, data.uvs[3]);
    }

    #[test]
    fn pipeline_follows_material_flags() {
        let plain = Material::standard("walls", Color::WHITE);
        assert_eq!(PipelineKind::for_material(&plain), PipelineKind::Opaque);
        assert_eq!(
            PipelineKind::for_material(&plain.clone().double_sided()),
            PipelineKind::OpaqueDoubleSided
        );
        assert_eq!(
            PipelineKind::for_material(&plain.double_sided().transparent()),
            PipelineKind::Transparent
        );
    }

    #[test]
    fn material_uniforms_flag_bound_maps() {
        let maps = TextureMaps {
            normal: Some(TextureHandle(1)),
            ..TextureMaps::default()
        };
        let m = Material::standard("door", Color::WHITE).with_maps(maps);
        let u = MaterialUniforms::from_material(&m);
        assert_eq!(u.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(u.params, [1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn frame_uniforms_without_directional_light_are_dark() {
        let frame = FrameSnapshot {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::new(1.0, 2.0, 3.0),
            ambient: [0.5; 3],
            directional: Vec::new(),
            draws: Vec::new(),
        };
        let u = FrameUniforms::from_snapshot(&frame);
        assert_eq!(u.light_radiance, [0.0; 4]);
        assert_eq!(u.camera_position, [1.0, 2.0, 3.0, 1.0]);

        let lit = FrameSnapshot {
            directional: vec![DirectionalLightData {
                direction: Vec3::NEG_Y,
                radiance: [0.5; 3],
            }],
            ..frame
        };
        let u = FrameUniforms::from_snapshot(&lit);
        assert_eq!(u.light_direction, [0.0, -1.0, 0.0, 0.0]);
        assert_eq!(u.light_radiance, [0.5, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn default_normal_texel_is_flat() {
        assert_eq!(MapRole::Normal.default_texel(), [128, 128, 255, 255]);
        assert_eq!(MapRole::Color.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(MapRole::Roughness.format(), wgpu::TextureFormat::Rgba8Unorm);
    }
}
