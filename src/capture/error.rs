//! Error types for capture operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Error type for the capture pipeline.
///
/// Every variant is fatal for the run; per-connector query failures are
/// logged and skipped during enumeration and never surface here.
#[derive(Debug)]
pub enum CaptureError {
    /// The DRM device node could not be opened
    DeviceOpen { path: PathBuf, source: io::Error },
    /// The device rejected the resource (connector) query outright
    Resources { source: io::Error },
    /// No connected connector with at least one mode was found
    NoActiveConnector,
    /// An explicitly requested connector does not exist or is not active
    ConnectorNotFound { name: String },
    /// The device rejected the dumb buffer allocation
    Allocation {
        width: u32,
        height: u32,
        source: io::Error,
    },
    /// The allocation could not be registered as a framebuffer
    Registration { source: io::Error },
    /// The allocation could not be mapped into process memory
    Map { source: io::Error },
    /// The frame layout violates the stride/size invariants
    BadLayout { detail: String },
    /// The output file could not be created or written
    OutputFile { path: PathBuf, source: io::Error },
    /// The JPEG codec rejected the frame
    Encode { source: image::ImageError },
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::DeviceOpen { path, source } => {
                write!(f, "failed to open DRM device {}: {}", path.display(), source)
            }
            CaptureError::Resources { source } => {
                write!(f, "failed to query DRM resources: {}", source)
            }
            CaptureError::NoActiveConnector => {
                write!(f, "no connected connector with at least one mode")
            }
            CaptureError::ConnectorNotFound { name } => {
                write!(f, "connector {} not found or not active", name)
            }
            CaptureError::Allocation {
                width,
                height,
                source,
            } => {
                write!(
                    f,
                    "failed to allocate {}x{} dumb buffer: {}",
                    width, height, source
                )
            }
            CaptureError::Registration { source } => {
                write!(f, "failed to register framebuffer: {}", source)
            }
            CaptureError::Map { source } => {
                write!(f, "failed to map dumb buffer: {}", source)
            }
            CaptureError::BadLayout { detail } => {
                write!(f, "invalid frame layout: {}", detail)
            }
            CaptureError::OutputFile { path, source } => {
                write!(f, "cannot write {}: {}", path.display(), source)
            }
            CaptureError::Encode { source } => {
                write!(f, "JPEG encoding failed: {}", source)
            }
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::DeviceOpen { source, .. }
            | CaptureError::Resources { source }
            | CaptureError::Allocation { source, .. }
            | CaptureError::Registration { source }
            | CaptureError::Map { source }
            | CaptureError::OutputFile { source, .. } => Some(source),
            CaptureError::Encode { source } => Some(source),
            CaptureError::NoActiveConnector
            | CaptureError::ConnectorNotFound { .. }
            | CaptureError::BadLayout { .. } => None,
        }
    }
}
