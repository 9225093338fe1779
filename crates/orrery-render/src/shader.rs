//! Shader module loading and caching.
//!
//! Shaders are read from the configured shader directory when the file is
//! present, otherwise the copy embedded in the binary is used. Sources are
//! parsed and validated with naga before the device sees them, so a broken
//! file comes back as [`ShaderError`] and the caller can abort startup.

use log::{debug, info};
use naga::front::wgsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use thiserror::Error;
use wgpu::{ShaderModuleDescriptor, ShaderSource};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to compile: {message}")]
    CompilationFailed { name: String, message: String },

    #[error("shader file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read shader file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("no shader directory configured for file-based loading")]
    NoShaderDir,
}

/// Named, compiled shader modules.
pub struct ShaderLibrary {
    modules: HashMap<String, Arc<wgpu::ShaderModule>>,
    shader_dir: Option<PathBuf>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
            shader_dir: None,
        }
    }

    /// Directory `.wgsl` files are looked up in.
    pub fn with_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    /// Compile `source` and store it under `name`, replacing any previous module.
    pub fn load_from_source(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        source: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        debug!("Compiling shader '{}'", name);
        validate_wgsl(name, source)?;

        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });

        let info = pollster::block_on(module.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
            .map(|m| m.message.clone())
            .collect();
        if !errors.is_empty() {
            return Err(ShaderError::CompilationFailed {
                name: name.to_string(),
                message: errors.join("\n"),
            });
        }

        let module = Arc::new(module);
        if self
            .modules
            .insert(name.to_string(), Arc::clone(&module))
            .is_some()
        {
            info!("Replaced shader '{}'", name);
        } else {
            info!("Loaded shader '{}'", name);
        }
        Ok(module)
    }

    /// Compile `filename` from the shader directory.
    pub fn load_from_file(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        filename: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        let shader_dir = self.shader_dir.as_ref().ok_or(ShaderError::NoShaderDir)?;
        let path = shader_dir.join(filename);
        if !path.exists() {
            return Err(ShaderError::FileNotFound { path });
        }

        debug!("Loading shader '{}' from {}", name, path.display());
        let source = std::fs::read_to_string(&path)?;
        self.load_from_source(device, name, &source)
    }

    /// Prefer `filename` in the shader directory, falling back to `embedded`
    /// when no directory is set or the file does not exist.
    pub fn load_or_embedded(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        filename: &str,
        embedded: &str,
    ) -> Result<Arc<wgpu::ShaderModule>, ShaderError> {
        match self.load_from_file(device, name, filename) {
            Err(ShaderError::NoShaderDir) | Err(ShaderError::FileNotFound { .. }) => {
                debug!("Using embedded source for shader '{}'", name);
                self.load_from_source(device, name, embedded)
            }
            other => other,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<wgpu::ShaderModule>> {
        self.modules.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse and validate WGSL without a device.
fn validate_wgsl(name: &str, source: &str) -> Result<(), ShaderError> {
    let failed = |message: String| ShaderError::CompilationFailed {
        name: name.to_string(),
        message,
    };
    let module = wgsl::parse_str(source).map_err(|err| failed(err.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| failed(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body_pipeline::BODY_SHADER_SOURCE;
    use crate::gpu::create_test_device;

    const VALID_SHADER: &str = r#"
        @vertex
        fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
            return vec4<f32>(0.0, 0.0, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 0.0, 1.0);
        }
    "#;

    #[test]
    fn test_library_starts_empty() {
        let library = ShaderLibrary::new();
        assert!(library.is_empty());
        assert!(library.get("body").is_none());
    }

    #[test]
    fn test_wgsl_validation() {
        assert!(validate_wgsl("body", BODY_SHADER_SOURCE).is_ok());
        assert!(validate_wgsl("valid", VALID_SHADER).is_ok());

        let parse = validate_wgsl("broken", "not wgsl at all");
        assert!(matches!(
            parse,
            Err(ShaderError::CompilationFailed { ref name, .. }) if name == "broken"
        ));

        let mistyped = "fn f() -> f32 { return true; }";
        assert!(matches!(
            validate_wgsl("mistyped", mistyped),
            Err(ShaderError::CompilationFailed { .. })
        ));
    }

    #[test]
    fn test_broken_file_is_a_compilation_error() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("body.wgsl"), "not wgsl at all").unwrap();

        let mut library = ShaderLibrary::new().with_shader_dir(dir.path());
        let result = library.load_or_embedded(&device, "body", "body.wgsl", BODY_SHADER_SOURCE);
        assert!(matches!(result, Err(ShaderError::CompilationFailed { .. })));
        assert!(library.is_empty());
    }

    #[test]
    fn test_body_shader_compiles() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        library
            .load_from_source(&device, "body", BODY_SHADER_SOURCE)
            .unwrap();
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_file_without_dir_is_an_error() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let mut library = ShaderLibrary::new();
        assert!(matches!(
            library.load_from_file(&device, "body", "body.wgsl"),
            Err(ShaderError::NoShaderDir)
        ));
    }

    #[test]
    fn test_file_on_disk_wins_over_embedded() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("custom.wgsl"), VALID_SHADER).unwrap();

        let mut library = ShaderLibrary::new().with_shader_dir(dir.path());
        library
            .load_or_embedded(&device, "custom", "custom.wgsl", "not wgsl at all")
            .unwrap();
        assert!(library.get("custom").is_some());
    }

    #[test]
    fn test_missing_file_uses_embedded() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let mut library = ShaderLibrary::new().with_shader_dir(dir.path());
        library
            .load_or_embedded(&device, "fallback", "missing.wgsl", VALID_SHADER)
            .unwrap();
        assert_eq!(library.len(), 1);
    }
}
