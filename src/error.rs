//! Error types for pulsefield.
//!
//! None of these are fatal to a host application. GPU and render failures
//! degrade the scene to its static fallback; configuration errors are
//! reported to whoever loaded the file.

use std::fmt;

/// Errors that can occur while acquiring a GPU drawing context.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The surface reported no usable texture format.
    NoSurfaceFormat,
    /// The target has a zero-sized drawable area.
    EmptySurface,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::NoSurfaceFormat => write!(f, "Surface exposes no supported texture format"),
            GpuError::EmptySurface => write!(f, "Render target has zero width or height"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors a renderer reports from a single frame.
///
/// Transient surface hiccups (timeouts, outdated swapchains) are not errors;
/// renderers swallow them and skip the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The device or drawing context went away mid-session.
    ContextLost(String),
    /// The GPU ran out of memory.
    OutOfMemory,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::ContextLost(reason) => write!(f, "Drawing context lost: {}", reason),
            RenderError::OutOfMemory => write!(f, "GPU out of memory"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Errors surfaced by the scene controller and the windowed viewer.
#[derive(Debug)]
pub enum SceneError {
    /// No GPU-capable drawing context on the target. The host shows its
    /// static placeholder instead.
    Unsupported(GpuError),
    /// The scene's configuration failed validation at mount.
    Config(ConfigError),
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Unsupported(e) => write!(f, "GPU drawing unavailable: {}", e),
            SceneError::Config(e) => write!(f, "Scene not mounted: {}", e),
            SceneError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            SceneError::Window(e) => write!(f, "Failed to create window: {}", e),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Unsupported(e) => Some(e),
            SceneError::Config(e) => Some(e),
            SceneError::EventLoop(e) => Some(e),
            SceneError::Window(e) => Some(e),
        }
    }
}

impl From<GpuError> for SceneError {
    fn from(e: GpuError) -> Self {
        SceneError::Unsupported(e)
    }
}

impl From<ConfigError> for SceneError {
    fn from(e: ConfigError) -> Self {
        SceneError::Config(e)
    }
}

impl From<winit::error::EventLoopError> for SceneError {
    fn from(e: winit::error::EventLoopError) -> Self {
        SceneError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for SceneError {
    fn from(e: winit::error::OsError) -> Self {
        SceneError::Window(e)
    }
}

/// Errors that can occur while loading a [`FieldConfig`](crate::FieldConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    Io(std::io::Error),
    /// The file is not valid JSON for the config schema.
    Parse(serde_json::Error),
    /// A value parsed but is outside its usable range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_scene_error_wraps_gpu_error() {
        let err: SceneError = GpuError::NoAdapter.into();
        assert!(matches!(err, SceneError::Unsupported(GpuError::NoAdapter)));
        assert!(err.to_string().contains("No compatible GPU adapter"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("exponent must be positive".into());
        assert_eq!(err.to_string(), "Invalid config: exponent must be positive");
        assert!(err.source().is_none());
    }
}
