//! DRM device handle.

use std::fs::{File, OpenOptions};
use std::os::unix::io::{AsFd, BorrowedFd};
use std::path::Path;

use super::error::CaptureError;

/// An open DRM device node.
///
/// Owns the file descriptor for the whole run; it is closed exactly once
/// when the handle drops, on success and on every failure path alike.
#[derive(Debug)]
pub struct Card(File);

impl AsFd for Card {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.0.as_fd()
    }
}

impl drm::Device for Card {}
impl drm::control::Device for Card {}

impl Card {
    /// Open a DRM device node read/write.
    ///
    /// Failure is fatal for the run: the device identity is configuration,
    /// not transient state, so there is no retry.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| CaptureError::DeviceOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Card(file))
    }
}
