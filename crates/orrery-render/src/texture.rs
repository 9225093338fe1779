//! Texture loading, upload, mipmap generation and caching.
//!
//! Images are decoded with the `image` crate, flipped vertically and mapped
//! by channel count onto a [`ChannelFormat`]. [`TextureManager`] uploads each
//! file once and hands out [`Arc<ManagedTexture>`]s with a ready-to-bind
//! bind group. A missing or undecodable file degrades to a shared magenta
//! placeholder so the scene keeps running.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A GPU texture with its view, bind group, and metadata.
pub struct ManagedTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// Texture + sampler, laid out per [`TextureManager::bind_group_layout`].
    pub bind_group: wgpu::BindGroup,
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
}

/// Errors that can occur while loading or creating a texture.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unsupported channel count {0}")]
    UnsupportedChannels(u8),

    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height} {format:?}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("texture is {width}x{height}, device limit is {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Colour layout of decoded pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFormat {
    Single,
    Rgb,
    Rgba,
}

impl ChannelFormat {
    /// 1 -> single, 3 -> RGB, 4 -> RGBA. Anything else is rejected.
    pub fn from_channel_count(channels: u8) -> Result<Self, TextureError> {
        match channels {
            1 => Ok(ChannelFormat::Single),
            3 => Ok(ChannelFormat::Rgb),
            4 => Ok(ChannelFormat::Rgba),
            other => Err(TextureError::UnsupportedChannels(other)),
        }
    }

    pub fn channel_count(self) -> usize {
        match self {
            ChannelFormat::Single => 1,
            ChannelFormat::Rgb => 3,
            ChannelFormat::Rgba => 4,
        }
    }

    /// GPU format the pixels are uploaded as. RGB has no 24-bit GPU format and
    /// is widened to RGBA.
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            ChannelFormat::Single => wgpu::TextureFormat::R8Unorm,
            ChannelFormat::Rgb | ChannelFormat::Rgba => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

/// Decoded, vertically flipped pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: ChannelFormat,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decode an in-memory image file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TextureError> {
        Self::from_dynamic(image::load_from_memory(bytes)?)
    }

    /// Decode the image at `path`.
    pub fn open(path: &Path) -> Result<Self, TextureError> {
        Self::from_dynamic(image::open(path)?)
    }

    fn from_dynamic(image: image::DynamicImage) -> Result<Self, TextureError> {
        let image = image.flipv();
        let (width, height) = (image.width(), image.height());
        // Two-channel (luma + alpha) images are promoted to RGBA.
        let channels = match image.color().channel_count() {
            2 => ChannelFormat::Rgba,
            n => ChannelFormat::from_channel_count(n)?,
        };
        let pixels = match channels {
            ChannelFormat::Single => image.into_luma8().into_raw(),
            ChannelFormat::Rgb => image.into_rgb8().into_raw(),
            ChannelFormat::Rgba => image.into_rgba8().into_raw(),
        };
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    /// Pixels laid out for [`ChannelFormat::texture_format`].
    pub fn upload_bytes(&self) -> std::borrow::Cow<'_, [u8]> {
        match self.channels {
            ChannelFormat::Rgb => self
                .pixels
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
                .collect::<Vec<u8>>()
                .into(),
            ChannelFormat::Single | ChannelFormat::Rgba => self.pixels.as_slice().into(),
        }
    }
}

/// Number of mip levels in a full chain for the given dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

/// Name under which the fallback texture is cached.
pub const PLACEHOLDER_NAME: &str = "placeholder";

/// Caches textures by name and owns the shared sampler and layout.
pub struct TextureManager {
    textures: HashMap<String, Arc<ManagedTexture>>,
    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    blit_shader: wgpu::ShaderModule,
    blit_pipeline_layout: wgpu::PipelineLayout,
    blit_sampler: wgpu::Sampler,
    placeholder: Arc<ManagedTexture>,
}

/// Fullscreen-triangle blit used to downsample one mip into the next.
const BLIT_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var src_texture: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_texture, src_sampler, in.uv);
}
"#;

fn texture_layout_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

impl TextureManager {
    /// Create the manager, its sampler and the placeholder texture.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("body-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture-bind-group-layout"),
            entries: &texture_layout_entries(),
        });

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit-shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER_SOURCE.into()),
        });

        // Same shape as the sampling layout, so it is reused for the blit.
        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let placeholder = create_managed(
            device,
            queue,
            &bind_group_layout,
            &sampler,
            PLACEHOLDER_NAME,
            &[255, 0, 255, 255],
            (1, 1),
            wgpu::TextureFormat::Rgba8UnormSrgb,
            1,
        );

        Self {
            textures: HashMap::new(),
            sampler,
            bind_group_layout,
            blit_shader,
            blit_pipeline_layout,
            blit_sampler,
            placeholder: Arc::new(placeholder),
        }
    }

    /// Load `file_name` from `dir`, or return the placeholder on failure.
    pub fn load_or_placeholder(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dir: &Path,
        file_name: &str,
    ) -> Arc<ManagedTexture> {
        if let Some(existing) = self.textures.get(file_name) {
            return Arc::clone(existing);
        }

        let path = dir.join(file_name);
        let result = DecodedImage::open(&path)
            .and_then(|image| self.create_texture(device, queue, file_name, &image, true));
        match result {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("Texture not found or unreadable: {} ({err})", path.display());
                let placeholder = Arc::clone(&self.placeholder);
                self.textures
                    .insert(file_name.to_string(), Arc::clone(&placeholder));
                placeholder
            }
        }
    }

    /// Upload decoded pixels under `name`. Returns the cached texture if the
    /// name was already uploaded.
    pub fn create_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        image: &DecodedImage,
        generate_mipmaps: bool,
    ) -> Result<Arc<ManagedTexture>, TextureError> {
        if let Some(existing) = self.textures.get(name) {
            return Ok(Arc::clone(existing));
        }

        let (width, height) = (image.width, image.height);
        let format = image.channels.texture_format();
        let data = image.upload_bytes();
        validate_dimensions(width, height, device.limits().max_texture_dimension_2d)?;
        validate_data_size(&data, width, height, format)?;

        let mip_levels = if generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };

        let managed = create_managed(
            device,
            queue,
            &self.bind_group_layout,
            &self.sampler,
            name,
            &data,
            (width, height),
            format,
            mip_levels,
        );
        if mip_levels > 1 {
            self.generate_mipmaps(device, queue, &managed.texture, format, mip_levels);
        }

        let managed = Arc::new(managed);
        self.textures.insert(name.to_string(), Arc::clone(&managed));
        log::info!("Created texture '{name}' ({width}x{height}, {mip_levels} mips)");
        Ok(managed)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ManagedTexture>> {
        self.textures.get(name).cloned()
    }

    /// Whether `texture` is the shared fallback.
    pub fn is_placeholder(&self, texture: &Arc<ManagedTexture>) -> bool {
        Arc::ptr_eq(texture, &self.placeholder)
    }

    /// Layout of every texture bind group: texture at 0, sampler at 1.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    fn generate_mipmaps(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        format: wgpu::TextureFormat,
        mip_count: u32,
    ) {
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mipmap-pipeline"),
            layout: Some(&self.blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.blit_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &self.blit_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mipmap-encoder"),
        });

        for level in 1..mip_count {
            let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mipmap-bind-group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mipmap-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[allow(clippy::too_many_arguments)]
fn create_managed(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    name: &str,
    data: &[u8],
    (width, height): (u32, u32),
    format: wgpu::TextureFormat,
    mip_levels: u32,
) -> ManagedTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(name),
        size,
        mip_level_count: mip_levels,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row(width, format)),
            rows_per_image: None,
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{name}-bind-group")),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    ManagedTexture {
        texture,
        view,
        bind_group,
        dimensions: (width, height),
        format,
        mip_level_count: mip_levels,
    }
}

fn expected_byte_size(width: u32, height: u32, format: wgpu::TextureFormat) -> usize {
    let bpp = format.block_copy_size(None).unwrap_or(4) as usize;
    width as usize * height as usize * bpp
}

fn bytes_per_row(width: u32, format: wgpu::TextureFormat) -> u32 {
    width * format.block_copy_size(None).unwrap_or(4)
}

fn validate_dimensions(width: u32, height: u32, max: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    if width > max || height > max {
        return Err(TextureError::TooLarge { width, height, max });
    }
    Ok(())
}

fn validate_data_size(
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<(), TextureError> {
    let expected = expected_byte_size(width, height, format);
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
            format,
        });
    }
    Ok(())
}
