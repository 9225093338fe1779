//! wgpu rendering for the orrery: surface management, sphere buffers and the
//! mesh cache, textures, shaders, the body pipelines and render passes.

pub mod body_pipeline;
pub mod buffer;
pub mod depth;
pub mod gpu;
pub mod mesh_cache;
pub mod pass;
pub mod shader;
pub mod texture;

pub use body_pipeline::{
    BODY_SHADER_FILE, BODY_SHADER_SOURCE, BodyPipelines, DrawPass, DrawUniform, FrameUniform,
    PointLight, UniformSlots,
};
pub use buffer::{BufferAllocator, MeshBuffer, vertex_layout};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh_cache::{MeshCache, MeshCacheError, MeshUploader};
pub use pass::{DEFAULT_CLEAR, FrameEncoder, RenderPassBuilder};
pub use shader::{ShaderError, ShaderLibrary};
pub use texture::{ChannelFormat, DecodedImage, ManagedTexture, TextureError, TextureManager};
