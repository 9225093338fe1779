//! Errors that abort the viewer.

use orrery_config::ConfigError;
use orrery_render::{MeshCacheError, RenderContextError, ShaderError, SurfaceError};
use orrery_scene::SceneError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid scene: {0}")]
    Scene(#[from] SceneError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("GPU initialization failed: {0}")]
    RenderContext(#[from] RenderContextError),

    #[error("shader error: {0}")]
    Shader(#[from] ShaderError),

    #[error("mesh upload failed: {0}")]
    Mesh(#[from] MeshCacheError),

    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}
