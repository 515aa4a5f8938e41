//! Device-side failures. All of them are fatal at init time.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error("shader/pipeline '{label}' failed to build: {message}")]
    Pipeline { label: &'static str, message: String },
    #[error("mesh with {vertices} vertices exceeds device limits")]
    MeshTooLarge { vertices: usize },
}

pub type RenderResult<T> = Result<T, RenderError>;
