//! Crate-wide error type.

use std::path::PathBuf;

use crate::geometry::GeometryError;

/// Errors raised while setting up the window, GPU or scene assets.
///
/// Per-frame failures (a lost surface, a missed frame) are recovered inside the
/// render graph and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to parse font {path}: {message}")]
    Font { path: PathBuf, message: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("scene entity missing during setup: {0}")]
    MissingEntity(#[from] hecs::NoSuchEntity),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_failures_convert_to_serialize_errors() {
        // A bare integer has no table to live in.
        let err: Error = toml::to_string(&1u32).unwrap_err().into();
        assert!(matches!(err, Error::ConfigSerialize(_)));
        assert!(err.to_string().starts_with("failed to serialize configuration"));
    }
}
