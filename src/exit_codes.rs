//! Exit codes for the CLI.
//!
//! Each failure class gets its own code so scripts can tell a missing
//! device from a dead output or a full disk without parsing stderr.

use crate::capture::CaptureError;

/// Exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Capture completed and the file was written
    Success = 0,
    /// General/unspecified error
    GeneralError = 1,
    /// Invalid command-line arguments (clap uses this too)
    InvalidArguments = 2,
    /// The DRM device could not be opened
    DeviceOpenFailed = 3,
    /// Discovery found no usable output
    NoActiveConnector = 4,
    /// The dumb buffer allocation was rejected
    AllocationFailed = 5,
    /// The framebuffer registration was rejected
    RegistrationFailed = 6,
    /// The buffer could not be mapped
    MapFailed = 7,
    /// Encoding or writing the output file failed
    EncodeFailed = 8,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitCode::Success => write!(f, "success"),
            ExitCode::GeneralError => write!(f, "general error"),
            ExitCode::InvalidArguments => write!(f, "invalid arguments"),
            ExitCode::DeviceOpenFailed => write!(f, "device open failed"),
            ExitCode::NoActiveConnector => write!(f, "no active connector"),
            ExitCode::AllocationFailed => write!(f, "allocation failed"),
            ExitCode::RegistrationFailed => write!(f, "registration failed"),
            ExitCode::MapFailed => write!(f, "map failed"),
            ExitCode::EncodeFailed => write!(f, "encode failed"),
        }
    }
}

impl From<&CaptureError> for ExitCode {
    fn from(err: &CaptureError) -> Self {
        match err {
            CaptureError::DeviceOpen { .. } => ExitCode::DeviceOpenFailed,
            CaptureError::Resources { .. }
            | CaptureError::NoActiveConnector
            | CaptureError::ConnectorNotFound { .. } => ExitCode::NoActiveConnector,
            CaptureError::Allocation { .. } => ExitCode::AllocationFailed,
            CaptureError::Registration { .. } => ExitCode::RegistrationFailed,
            CaptureError::Map { .. } => ExitCode::MapFailed,
            CaptureError::BadLayout { .. }
            | CaptureError::OutputFile { .. }
            | CaptureError::Encode { .. } => ExitCode::EncodeFailed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    fn io_err() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "boom")
    }

    #[test]
    fn every_failure_class_has_its_own_code() {
        let cases = [
            (
                CaptureError::DeviceOpen {
                    path: PathBuf::from("/dev/dri/card0"),
                    source: io_err(),
                },
                ExitCode::DeviceOpenFailed,
            ),
            (CaptureError::NoActiveConnector, ExitCode::NoActiveConnector),
            (
                CaptureError::ConnectorNotFound {
                    name: "HDMIA-1".into(),
                },
                ExitCode::NoActiveConnector,
            ),
            (
                CaptureError::Allocation {
                    width: 1920,
                    height: 1080,
                    source: io_err(),
                },
                ExitCode::AllocationFailed,
            ),
            (
                CaptureError::Registration { source: io_err() },
                ExitCode::RegistrationFailed,
            ),
            (CaptureError::Map { source: io_err() }, ExitCode::MapFailed),
            (
                CaptureError::Encode {
                    source: image::ImageError::IoError(io_err()),
                },
                ExitCode::EncodeFailed,
            ),
            (
                CaptureError::OutputFile {
                    path: PathBuf::from("out.jpeg"),
                    source: io_err(),
                },
                ExitCode::EncodeFailed,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ExitCode::from(&err), expected, "wrong code for {err}");
        }
    }

    #[test]
    fn success_is_zero_and_failures_are_not() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_ne!(ExitCode::EncodeFailed.as_i32(), 0);
        assert_eq!(ExitCode::DeviceOpenFailed.as_i32(), 3);
    }
}
