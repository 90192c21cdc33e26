use crate::RenderError;
use crate::resources::{
    FrameUniforms, InstanceData, MIN_INSTANCE_CAPACITY, MapRole, MaterialUniforms, PipelineKind,
    Vertex, instance_buffer_size, instance_capacity, mesh_vertices, upload_image,
};
use crate::shaders;
use haunted_assets::{ImageData, TextureStore};
use haunted_common::{GeometryHandle, MaterialHandle, TextureHandle};
use haunted_render::{FrameSnapshot, SurfaceSize};
use haunted_scene::{Material, Scene};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct GpuMaterial {
    bind_group: wgpu::BindGroup,
    pipeline: PipelineKind,
}

/// Offscreen color and depth at the drawing-buffer size, plus the bind
/// group that samples the color into the window surface.
struct SceneTarget {
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    blit_bind_group: wgpu::BindGroup,
    size: SurfaceSize,
}

/// wgpu-based scene renderer.
///
/// Geometry and materials are uploaded once by [`upload_scene`]; each frame
/// only the per-frame uniforms and the instance buffer are rewritten. The
/// scene is drawn offscreen at the capped drawing-buffer size and then
/// stretched over the whole window surface.
///
/// [`upload_scene`]: WgpuRenderer::upload_scene
pub struct WgpuRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    double_sided_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    blit_layout: wgpu::BindGroupLayout,
    material_sampler: wgpu::Sampler,
    blit_sampler: wgpu::Sampler,
    default_maps: BTreeMap<MapRole, wgpu::TextureView>,
    textures: BTreeMap<(TextureHandle, MapRole), wgpu::TextureView>,
    meshes: BTreeMap<GeometryHandle, GpuMesh>,
    materials: BTreeMap<MaterialHandle, GpuMaterial>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    target: SceneTarget,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        size: SurfaceSize,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::from_snapshot(&empty_frame())),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let mut material_entries = vec![
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            sampler_entry(1),
        ];
        material_entries.extend((0..MapRole::ALL.len() as u32).map(|i| texture_entry(2 + i)));
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &material_entries,
        });

        let blit_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit_bind_group_layout"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &material_layout],
            push_constant_ranges: &[],
        });
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let opaque_pipeline = mesh_pipeline(
            device,
            &mesh_layout,
            &mesh_shader,
            surface_format,
            PipelineKind::Opaque,
        );
        let double_sided_pipeline = mesh_pipeline(
            device,
            &mesh_layout,
            &mesh_shader,
            surface_format,
            PipelineKind::OpaqueDoubleSided,
        );
        let transparent_pipeline = mesh_pipeline(
            device,
            &mesh_layout,
            &mesh_shader,
            surface_format,
            PipelineKind::Transparent,
        );

        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit_pipeline_layout"),
            bind_group_layouts: &[&blit_layout],
            push_constant_ranges: &[],
        });
        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLIT_SHADER.into()),
        });
        let blit_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("blit_pipeline"),
            layout: Some(&blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blit_shader,
                entry_point: Some("vs_blit"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &blit_shader,
                entry_point: Some("fs_blit"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("material_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let default_maps = MapRole::ALL
            .into_iter()
            .map(|role| {
                let image = ImageData::solid(1, 1, role.default_texel());
                let view = upload_image(device, queue, "default_map", &image, role.format());
                (role, view)
            })
            .collect();

        let instance_buffer = create_instance_buffer(device, MIN_INSTANCE_CAPACITY);

        let target = Self::create_target(device, &blit_layout, &blit_sampler, surface_format, size);

        Self {
            opaque_pipeline,
            double_sided_pipeline,
            transparent_pipeline,
            blit_pipeline,
            frame_buffer,
            frame_bind_group,
            material_layout,
            blit_layout,
            material_sampler,
            blit_sampler,
            default_maps,
            textures: BTreeMap::new(),
            meshes: BTreeMap::new(),
            materials: BTreeMap::new(),
            instance_buffer,
            instance_capacity: MIN_INSTANCE_CAPACITY,
            target,
            surface_format,
        }
    }

    /// Recreate the offscreen color and depth targets at `size`.
    pub fn resize(&mut self, device: &wgpu::Device, size: SurfaceSize) {
        if size == self.target.size {
            return;
        }
        self.target = Self::create_target(
            device,
            &self.blit_layout,
            &self.blit_sampler,
            self.surface_format,
            size,
        );
        tracing::debug!("scene target resized to {}x{}", size.width, size.height);
    }

    /// Upload every geometry and material in `scene` that is not on the GPU
    /// yet. Texture maps missing from `textures` fall back to defaults.
    pub fn upload_scene(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        textures: &TextureStore,
    ) {
        for (handle, geometry) in scene.geometries() {
            if self.meshes.contains_key(handle) {
                continue;
            }
            let data = geometry.tessellate();
            let vertices = mesh_vertices(&data);
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(geometry.kind_name()),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(geometry.kind_name()),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            self.meshes.insert(
                *handle,
                GpuMesh {
                    vertex_buffer,
                    index_buffer,
                    index_count: data.indices.len() as u32,
                },
            );
        }

        for (handle, material) in scene.materials() {
            if self.materials.contains_key(handle) {
                continue;
            }
            let gpu = self.create_material(device, queue, material, textures);
            self.materials.insert(*handle, gpu);
        }

        tracing::info!(
            "uploaded {} meshes, {} materials, {} textures",
            self.meshes.len(),
            self.materials.len(),
            self.textures.len()
        );
    }

    /// Render one frame into `output`: scene pass offscreen, then the blit.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        output: &wgpu::TextureView,
        frame: &FrameSnapshot,
    ) -> Result<(), RenderError> {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::from_snapshot(frame)),
        );

        if frame.draws.len() > self.instance_capacity {
            self.instance_capacity = instance_capacity(frame.draws.len());
            self.instance_buffer = create_instance_buffer(device, self.instance_capacity);
            tracing::debug!("instance buffer grown to {} slots", self.instance_capacity);
        }
        let mut batch = Vec::with_capacity(frame.draws.len());
        for draw in &frame.draws {
            let mesh = self
                .meshes
                .get(&draw.geometry)
                .ok_or(RenderError::MissingGeometry(draw.geometry))?;
            let material = self
                .materials
                .get(&draw.material)
                .ok_or(RenderError::MissingMaterial(draw.material))?;
            batch.push((mesh, material, InstanceData::from_matrix(draw.model)));
        }
        if !batch.is_empty() {
            let instances: Vec<InstanceData> = batch.iter().map(|(_, _, i)| *i).collect();
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            let mut bound = None;
            for (index, (mesh, material, _)) in batch.iter().enumerate() {
                if bound != Some(material.pipeline) {
                    pass.set_pipeline(self.pipeline(material.pipeline));
                    bound = Some(material.pipeline);
                }
                pass.set_bind_group(1, &material.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                let instance = index as u32;
                pass.draw_indexed(0..mesh.index_count, 0, instance..instance + 1);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: output,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &self.target.blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn pipeline(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Opaque => &self.opaque_pipeline,
            PipelineKind::OpaqueDoubleSided => &self.double_sided_pipeline,
            PipelineKind::Transparent => &self.transparent_pipeline,
        }
    }

    fn create_material(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material: &Material,
        textures: &TextureStore,
    ) -> GpuMaterial {
        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(material.name.as_str()),
            contents: bytemuck::bytes_of(&MaterialUniforms::from_material(material)),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let maps = &material.maps;
        let slots = [
            (MapRole::Color, maps.color),
            (MapRole::Normal, maps.normal),
            (MapRole::AmbientOcclusion, maps.ambient_occlusion),
            (MapRole::Roughness, maps.roughness),
            (MapRole::Alpha, maps.alpha),
        ];
        for (role, handle) in slots {
            let Some(handle) = handle else { continue };
            if self.textures.contains_key(&(handle, role)) {
                continue;
            }
            match textures.get(handle) {
                Some(texture) => {
                    let view = upload_image(device, queue, &texture.path, &texture.image, role.format());
                    self.textures.insert((handle, role), view);
                }
                None => tracing::warn!(
                    "material '{}' references texture {handle:?} that was never loaded",
                    material.name
                ),
            }
        }

        let views: Vec<&wgpu::TextureView> = slots
            .iter()
            .map(|(role, handle)| {
                handle
                    .and_then(|h| self.textures.get(&(h, *role)))
                    .unwrap_or(&self.default_maps[role])
            })
            .collect();

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.material_sampler),
            },
        ];
        entries.extend(views.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: 2 + i as u32,
            resource: wgpu::BindingResource::TextureView(view),
        }));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(material.name.as_str()),
            layout: &self.material_layout,
            entries: &entries,
        });

        GpuMaterial {
            bind_group,
            pipeline: PipelineKind::for_material(material),
        }
    }

    fn create_target(
        device: &wgpu::Device,
        blit_layout: &wgpu::BindGroupLayout,
        blit_sampler: &wgpu::Sampler,
        format: wgpu::TextureFormat,
        size: SurfaceSize,
    ) -> SceneTarget {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let color = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("scene_color"),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
            .create_view(&Default::default());
        let depth = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("scene_depth"),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&Default::default());
        let blit_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit_bind_group"),
            layout: blit_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&color),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(blit_sampler),
                },
            ],
        });
        SceneTarget {
            color,
            depth,
            blit_bind_group,
            size: SurfaceSize {
                width: extent.width,
                height: extent.height,
            },
        }
    }
}

fn mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    kind: PipelineKind,
) -> wgpu::RenderPipeline {
    let (label, cull_mode, blend, depth_write_enabled) = match kind {
        PipelineKind::Opaque => ("opaque_pipeline", Some(wgpu::Face::Back), wgpu::BlendState::REPLACE, true),
        PipelineKind::OpaqueDoubleSided => ("double_sided_pipeline", None, wgpu::BlendState::REPLACE, true),
        PipelineKind::Transparent => (
            "transparent_pipeline",
            Some(wgpu::Face::Back),
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        ),
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                        2 => Float32x2,
                    ],
                },
                wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<InstanceData>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        3 => Float32x4,
                        4 => Float32x4,
                        5 => Float32x4,
                        6 => Float32x4,
                    ],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instance_buffer"),
        size: instance_buffer_size(capacity),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn empty_frame() -> FrameSnapshot {
    FrameSnapshot {
        view: glam::Mat4::IDENTITY,
        projection: glam::Mat4::IDENTITY,
        camera_position: glam::Vec3::ZERO,
        ambient: [0.0; 3],
        directional: Vec::new(),
        draws: Vec::new(),
    }
}
