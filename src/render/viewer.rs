//! Slider controller: winit application plus the wgpu fullscreen-quad
//! pipeline.
//!
//! All timing flows through the frame clock: every `about_to_wait` drains
//! loader replies, ticks the transition scheduler, repacks the uniform block
//! and requests a redraw. Image decodes are the only asynchronous operation
//! and never block the loop; slots without a decoded texture render the
//! black placeholder.

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use crossbeam_channel as xchan;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};
use wgpu::SurfaceError;
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::Configuration;
use crate::fit::{FitParams, fit};
use crate::render::loader::{LoaderMsg, LoaderReply, spawn_loader};
use crate::scheduler::TransitionScheduler;
use crate::session::{SliderSession, SlotId};
use crate::shading::{ActiveEffect, FrameInputs};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

const QUAD: [Vertex; 4] = [
    //   NDC pos         UV
    Vertex {
        pos: [-1.0, -1.0],
        uv: [0.0, 1.0],
    }, // bottom-left
    Vertex {
        pos: [1.0, -1.0],
        uv: [1.0, 1.0],
    }, // bottom-right
    Vertex {
        pos: [-1.0, 1.0],
        uv: [0.0, 0.0],
    }, // top-left
    Vertex {
        pos: [1.0, 1.0],
        uv: [1.0, 0.0],
    }, // top-right
];

/// Run the slider until the window is closed.
///
/// # Errors
/// Returns an error if the rendering backend fails to initialize or the
/// configured playlist is empty.
pub fn run(cfg: Configuration) -> Result<()> {
    info!(
        count = cfg.images.len(),
        width = cfg.width,
        height = cfg.height,
        "starting slider"
    );
    let event_loop = EventLoop::new()?;
    let mut app = App::new(cfg)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct Tex {
    view: wgpu::TextureView,
    w: u32,
    h: u32,
}

impl Tex {
    fn is_placeholder(&self) -> bool {
        self.w == 1 && self.h == 1
    }
}

struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    vbuf: wgpu::Buffer,
    uniform_buf: wgpu::Buffer,
    sampler: wgpu::Sampler,

    tex_current: Tex,
    tex_next: Tex,
    tex_map: Tex,
}

impl Gpu {
    fn container_aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}

struct App {
    cfg: Configuration,
    session: SliderSession,
    scheduler: Option<TransitionScheduler>,
    active_effect: ActiveEffect,
    fit_map: FitParams,
    rng: StdRng,
    started_at: Instant,

    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,

    tx_req: xchan::Sender<LoaderMsg>,
    rx_res: xchan::Receiver<LoaderReply>,
}

impl App {
    fn new(cfg: Configuration) -> Result<Self> {
        let session = SliderSession::new(cfg.images.clone())?;
        let (tx_req, rx_req) = xchan::unbounded::<LoaderMsg>();
        let (tx_res, rx_res) = xchan::unbounded::<LoaderReply>();
        // Detached; the thread exits on Quit or when the request channel
        // drops.
        let _ = spawn_loader(rx_req, tx_res);

        let mut rng = StdRng::from_os_rng();
        let active_effect = cfg.effect.select_active(&mut rng);

        Ok(Self {
            cfg,
            session,
            scheduler: None,
            active_effect,
            fit_map: FitParams::IDENTITY,
            rng,
            started_at: Instant::now(),
            window: None,
            gpu: None,
            tx_req,
            rx_res,
        })
    }

    fn decode_target(&self) -> (u32, u32) {
        let size = self
            .gpu
            .as_ref()
            .map(|gpu| (gpu.config.width, gpu.config.height))
            .unwrap_or((self.cfg.width, self.cfg.height));
        (size.0.max(1), size.1.max(1))
    }

    fn request_decode(&self, source: std::path::PathBuf, slot: SlotId, generation: u64) {
        let _ = self.tx_req.send(LoaderMsg::Decode {
            source,
            slot,
            generation,
            target: self.decode_target(),
        });
    }

    /// Queue decodes for the live pair plus the displacement map.
    fn request_initial_loads(&self) {
        let generation = self.session.generation();
        self.request_decode(
            self.session.current().source.clone(),
            SlotId::Current,
            generation,
        );
        self.request_decode(self.session.next().source.clone(), SlotId::Next, generation);
        if let Some(map) = self.cfg.displacement_map() {
            self.request_decode(map, SlotId::Map, generation);
        }
    }

    fn refit(&mut self) {
        let Some(gpu) = &self.gpu else { return };
        let container_ar = gpu.container_aspect_ratio();
        self.session.refit(container_ar);
        let map_ar = if gpu.tex_map.is_placeholder() {
            1.0
        } else {
            gpu.tex_map.w as f32 / gpu.tex_map.h as f32
        };
        self.fit_map = fit(map_ar, container_ar);
    }

    /// Applies one loader reply, discarding stale generations.
    fn apply_reply(&mut self, reply: LoaderReply) {
        match reply {
            LoaderReply::Decoded(decoded) => {
                if !self
                    .session
                    .resolve_aspect(decoded.slot, decoded.generation, decoded.aspect_ratio())
                {
                    debug!(
                        generation = decoded.generation,
                        current = self.session.generation(),
                        "discarding stale decode"
                    );
                    return;
                }
                let Some(gpu) = &mut self.gpu else { return };
                let tex = upload_texture(
                    &gpu.device,
                    &gpu.queue,
                    &decoded.pixels,
                    decoded.size.0,
                    decoded.size.1,
                );
                match decoded.slot {
                    SlotId::Current => gpu.tex_current = tex,
                    SlotId::Next => gpu.tex_next = tex,
                    SlotId::Map => gpu.tex_map = tex,
                }
                rebuild_bind_group(gpu);
                self.refit();
            }
            LoaderReply::Failed {
                slot, generation, ..
            } => {
                // Aspect falls back to square; the texture slot stays on the
                // placeholder and rendering continues.
                self.session.resolve_aspect(slot, generation, 1.0);
                self.refit();
            }
        }
    }

    /// Rotates the session after a completed transition and kicks off the
    /// decode for the new next slide.
    fn advance(&mut self) {
        let Some(gpu) = &mut self.gpu else { return };
        let placeholder = upload_texture(&gpu.device, &gpu.queue, &[0, 0, 0, 255], 1, 1);
        gpu.tex_current = std::mem::replace(&mut gpu.tex_next, placeholder);
        rebuild_bind_group(gpu);

        let generation = self.session.advance();
        debug!(
            index = self.session.current_index(),
            generation, "advanced slide"
        );
        self.active_effect = self.cfg.effect.select_active(&mut self.rng);
        self.refit();
        self.request_decode(self.session.next().source.clone(), SlotId::Next, generation);
    }

    fn write_uniforms(&self, progress: f32) {
        let Some(gpu) = &self.gpu else { return };
        let frame = FrameInputs {
            progress,
            time: self.started_at.elapsed().as_secs_f32(),
            fit_current: self.session.current().fit,
            fit_next: self.session.next().fit,
            fit_map: self.fit_map,
        };
        let uniforms = self.active_effect.pack(&frame);
        gpu.queue
            .write_buffer(&gpu.uniform_buf, 0, bytemuck::bytes_of(&uniforms));
    }

    fn shutdown(&self, event_loop: &ActiveEventLoop) {
        info!("stopping slider");
        let _ = self.tx_req.send(LoaderMsg::Quit);
        event_loop.exit();
    }

    fn draw(&mut self) {
        let acquired = match &self.gpu {
            Some(gpu) => gpu.surface.get_current_texture(),
            None => return,
        };
        let frame = match acquired {
            Ok(frame) => frame,
            Err(SurfaceError::Outdated | SurfaceError::Lost) => {
                info!("surface lost; reconfiguring");
                if let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.window.as_ref()) {
                    let size = window.inner_size();
                    gpu.config.width = size.width.max(1);
                    gpu.config.height = size.height.max(1);
                    gpu.surface.configure(&gpu.device, &gpu.config);
                }
                return;
            }
            Err(err) => {
                warn!(error = %err, "failed to acquire surface frame");
                return;
            }
        };
        let Some(gpu) = &self.gpu else { return };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("slider-encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("slider-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&gpu.pipeline);
            rpass.set_bind_group(0, &gpu.bind_group, &[]);
            rpass.set_vertex_buffer(0, gpu.vbuf.slice(..));
            rpass.draw(0..4, 0..1);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
    }

    fn init_gpu(&mut self, window: Arc<Window>) -> Result<()> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to acquire GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("slider-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .context("failed to acquire GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .unwrap_or(caps.formats[0]);
        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            "slider surface configured",
        );

        // All three slots start as 1x1 black; an unset slot renders black
        // rather than stalling the loop.
        let tex_current = upload_texture(&device, &queue, &[0, 0, 0, 255], 1, 1);
        let tex_next = upload_texture(&device, &queue, &[0, 0, 0, 255], 1, 1);
        let tex_map = upload_texture(&device, &queue, &[128, 128, 128, 255], 1, 1);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("slider-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("effect-uniforms"),
            size: std::mem::size_of::<crate::shading::EffectUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad"),
            contents: bytemuck::cast_slice(&QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("slider-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/slider.wgsl").into()),
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("slider-bind-layout"),
            entries: &[
                texture_entry(0),
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let vlayout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
        };

        let pip_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("slider-pipeline-layout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("slider-pipeline"),
            layout: Some(&pip_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vlayout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let bind_group = build_bind_group(
            &device,
            &bind_layout,
            &tex_current,
            &tex_next,
            &tex_map,
            &sampler,
            &uniform_buf,
        );

        self.gpu = Some(Gpu {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_layout,
            bind_group,
            vbuf,
            uniform_buf,
            sampler,
            tex_current,
            tex_next,
            tex_map,
        });
        self.refit();
        self.write_uniforms(0.0);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = WindowAttributes::default()
            .with_title("shader slider")
            .with_inner_size(PhysicalSize::new(self.cfg.width, self.cfg.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!(error = %err, "failed to create slider window");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        if let Err(err) = self.init_gpu(window) {
            error!(error = ?err, "failed to initialize GPU state");
            event_loop.exit();
            return;
        }

        self.request_initial_loads();
        self.started_at = Instant::now();
        self.scheduler = Some(TransitionScheduler::new(
            self.cfg.dwell(),
            self.cfg.transition(),
            Instant::now(),
        ));
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = &self.window else { return };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Released {
                    use winit::keyboard::{KeyCode, PhysicalKey};
                    if let PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ) = event.physical_key {
                        self.shutdown(event_loop);
                    }
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(gpu) = &mut self.gpu
                    && width > 0
                    && height > 0
                {
                    gpu.config.width = width;
                    gpu.config.height = height;
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    debug!(width, height, "slider surface resized");
                    self.refit();
                }
            }
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.gpu.is_none() {
            return;
        }

        while let Ok(reply) = self.rx_res.try_recv() {
            self.apply_reply(reply);
        }

        let advanced = match self.scheduler.as_mut() {
            Some(scheduler) => scheduler.tick(Instant::now()).is_some(),
            None => false,
        };
        if advanced {
            self.advance();
        }

        let progress = self
            .scheduler
            .as_ref()
            .map(TransitionScheduler::progress)
            .unwrap_or(0.0);
        self.write_uniforms(progress);

        // Continuous redraw: the noise field animates even while idle.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    w: u32,
    h: u32,
) -> Tex {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("slide"),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        tex.as_image_copy(),
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    Tex {
        view: tex.create_view(&wgpu::TextureViewDescriptor::default()),
        w,
        h,
    }
}

#[allow(clippy::too_many_arguments)]
fn build_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    tex_current: &Tex,
    tex_next: &Tex,
    tex_map: &Tex,
    sampler: &wgpu::Sampler,
    uniform_buf: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("slider-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&tex_current.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&tex_next.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&tex_map.view),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: uniform_buf.as_entire_binding(),
            },
        ],
    })
}

fn rebuild_bind_group(gpu: &mut Gpu) {
    gpu.bind_group = build_bind_group(
        &gpu.device,
        &gpu.bind_layout,
        &gpu.tex_current,
        &gpu.tex_next,
        &gpu.tex_map,
        &gpu.sampler,
        &gpu.uniform_buf,
    );
}

impl Drop for App {
    fn drop(&mut self) {
        // Deterministic teardown: stop the loader so no decode callback can
        // outlive the session.
        let _ = self.tx_req.send(LoaderMsg::Quit);
    }
}
