use crate::shaders;
use bytemuck::{Pod, Zeroable};
use carscene_render::{DrawCall, LightRig, RenderBackend};
use glam::Mat4;
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

/// Upper bound on boxes per frame. The scene draws 13.
pub const MAX_DRAWS: usize = 32;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Failures while building GPU resources.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("shader or pipeline validation failed: {0}")]
    Validation(String),
    #[error("device out of memory while creating {0}")]
    OutOfMemory(&'static str),
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    light_color: [f32; 4],
    light_direction: [f32; 4],
    light_position: [f32; 4],
    ambient: [f32; 4],
}

impl Globals {
    fn new(view: Mat4, proj: Mat4, lights: &LightRig) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            light_color: lights.color.extend(1.0).to_array(),
            light_direction: lights.direction.extend(0.0).to_array(),
            light_position: lights.position.extend(1.0).to_array(),
            ambient: lights.ambient.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
    mode: [u32; 4],
}

impl From<&DrawCall> for DrawUniforms {
    fn from(call: &DrawCall) -> Self {
        let [r, g, b] = call.color;
        Self {
            model: call.model.to_cols_array_2d(),
            normal_matrix: call.normal_matrix.to_cols_array_2d(),
            color: [r, g, b, 1.0],
            mode: [call.light_mode.shader_flag(), 0, 0, 0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// Round `size` up to the next multiple of `alignment`.
fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// Unit box spanning -0.5..0.5 on every axis, 24 vertices so each face has its own normal.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

/// wgpu implementation of [`RenderBackend`].
///
/// Draw calls are buffered between `begin_frame` and `present`; `present`
/// uploads them and encodes one render pass.
pub struct WgpuRenderer {
    pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_stride: u64,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    depth_texture: wgpu::TextureView,
    lights: LightRig,
    view: Mat4,
    projection: Mat4,
    pending: Vec<DrawCall>,
    dropped: usize,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Result<Self, BackendError> {
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&Globals::new(
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                &LightRig::default(),
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let draw_size = std::mem::size_of::<DrawUniforms>() as u64;
        let draw_stride = aligned_stride(
            draw_size,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let draw_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_buffer"),
            size: draw_stride * MAX_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(draw_size),
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bind_group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let draw_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout: &draw_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &draw_buffer,
                    offset: 0,
                    size: NonZeroU64::new(draw_size),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &draw_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x3,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let (vertices, indices) = cube_mesh();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("box_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("box_index_buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(BackendError::Validation(err.to_string()));
        }
        if pollster::block_on(device.pop_error_scope()).is_some() {
            return Err(BackendError::OutOfMemory("scene buffers"));
        }

        tracing::info!(
            format = ?surface_format,
            draw_stride,
            max_draws = MAX_DRAWS,
            "wgpu scene renderer ready"
        );

        Ok(Self {
            pipeline,
            globals_buffer,
            globals_bind_group,
            draw_buffer,
            draw_bind_group,
            draw_stride,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            depth_texture,
            lights: LightRig::default(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            pending: Vec::with_capacity(MAX_DRAWS),
            dropped: 0,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Upload the buffered frame and encode it into `view`.
    pub fn present(&self, device: &wgpu::Device, queue: &wgpu::Queue, view: &wgpu::TextureView) {
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals::new(self.view, self.projection, &self.lights)),
        );

        let stride = self.draw_stride as usize;
        let mut staging = vec![0u8; stride * self.pending.len()];
        for (slot, call) in staging.chunks_exact_mut(stride).zip(&self.pending) {
            let uniforms = DrawUniforms::from(call);
            let bytes = bytemuck::bytes_of(&uniforms);
            slot[..bytes.len()].copy_from_slice(bytes);
        }
        if !staging.is_empty() {
            queue.write_buffer(&self.draw_buffer, 0, &staging);
        }

        let [r, g, b, a] = self.lights.clear_color.map(f64::from);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            for i in 0..self.pending.len() {
                let offset = (i as u64 * self.draw_stride) as u32;
                pass.set_bind_group(1, &self.draw_bind_group, &[offset]);
                pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

impl RenderBackend for WgpuRenderer {
    fn begin_frame(&mut self, lights: &LightRig) {
        if self.dropped > 0 {
            tracing::warn!(dropped = self.dropped, max = MAX_DRAWS, "draw calls dropped last frame");
        }
        self.lights = *lights;
        self.pending.clear();
        self.dropped = 0;
    }

    fn draw_box(&mut self, call: &DrawCall) {
        if self.pending.len() < MAX_DRAWS {
            self.pending.push(*call);
        } else {
            self.dropped += 1;
        }
    }

    fn set_camera(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carscene_common::LightMode;
    use carscene_kernel::SceneState;
    use carscene_render::{PartId, car_parts};
    use glam::Vec3;

    /// Car-frame bounds of a part as drawn with the backend's box mesh.
    fn part_bounds(scene: &SceneState, id: PartId) -> (Vec3, Vec3) {
        let part = car_parts(scene).into_iter().find(|p| p.id == id).unwrap();
        let model = part.ops.iter().fold(Mat4::IDENTITY, |m, op| m * op.matrix());
        let (vertices, _) = cube_mesh();
        vertices
            .iter()
            .map(|v| model.transform_point3(Vec3::from(v.position)))
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            })
    }

    #[test]
    fn trim_parts_stick_out_of_body() {
        let scene = SceneState::default();
        let (body_lo, body_hi) = part_bounds(&scene, PartId::Body);
        assert!((body_hi - Vec3::new(0.75, 0.25, 0.375)).length() < 1e-5);
        assert!((body_lo + body_hi).length() < 1e-5);

        for id in [PartId::HeadlightLeft, PartId::HeadlightRight, PartId::Bumper] {
            let (_, hi) = part_bounds(&scene, id);
            assert!(hi.x > body_hi.x + 0.05, "{id} hidden behind the nose");
        }
        let (spare_lo, _) = part_bounds(&scene, PartId::SpareTire);
        assert!(spare_lo.x < body_lo.x - 0.1, "spare tire hidden in the body");
    }

    #[test]
    fn door_hinge_sits_at_panel_front() {
        let scene = SceneState::default();
        for (id, hinge) in [
            (PartId::DoorRight, Vec3::new(0.0, 0.18, 0.4)),
            (PartId::DoorLeft, Vec3::new(0.0, 0.18, -0.4)),
        ] {
            let (lo, hi) = part_bounds(&scene, id);
            let length = hi.x - lo.x;
            assert!((length - 0.5).abs() < 1e-5);
            // The hinge is inside the panel, in its front fifth.
            assert!(hinge.x >= lo.x && hinge.x <= hi.x, "{id}");
            assert!(hi.x - hinge.x <= 0.2 * length, "{id} pivots near its centre");
            assert!(hinge.z >= lo.z && hinge.z <= hi.z, "{id}");
            assert!(hinge.y >= lo.y && hinge.y <= hi.y, "{id}");
        }
    }

    #[test]
    fn stride_rounds_up() {
        let size = std::mem::size_of::<DrawUniforms>() as u64;
        assert_eq!(size, 160);
        assert_eq!(aligned_stride(size, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(size, 0), size);
    }

    #[test]
    fn globals_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<Globals>(), 192);
    }

    #[test]
    fn cube_normals_point_outward() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for v in &vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert_eq!(p.dot(n), 0.5);
        }
    }

    #[test]
    fn cube_winding_is_counter_clockwise() {
        let (vertices, indices) = cube_mesh();
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a).normalize();
            let n = Vec3::from(vertices[tri[0] as usize].normal);
            assert!((face_normal - n).length() < 1e-6);
        }
    }

    #[test]
    fn draw_uniforms_carry_mode_flag() {
        let call = DrawCall::new(PartId::Body, [0.2, 0.4, 0.6], Mat4::IDENTITY, LightMode::Point);
        let uniforms = DrawUniforms::from(&call);
        assert_eq!(uniforms.mode, [1, 0, 0, 0]);
        assert_eq!(uniforms.color, [0.2, 0.4, 0.6, 1.0]);

        let call = DrawCall::new(PartId::Ground, [1.0; 3], Mat4::IDENTITY, LightMode::Directional);
        assert_eq!(DrawUniforms::from(&call).mode[0], 0);
    }
}
