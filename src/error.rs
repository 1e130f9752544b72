//! Error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    #[error("failed to create device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("buffer mapping failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this error means a compute backend couldn't be brought up.
    ///
    /// These are recovered by falling back to a slower backend.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(
            self,
            Error::NoAdapter | Error::DeviceCreation(_) | Error::ThreadPool(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
