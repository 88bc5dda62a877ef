//! Scratch buffer lifecycle: allocate, register, map, release.
//!
//! The three device-side resources (dumb buffer allocation, framebuffer
//! registration, memory mapping) form a strict acquire/release stack.
//! The mapping borrows the buffer, so it cannot outlive `release`; the
//! remaining two are torn down in reverse acquisition order, each step
//! skipped when that resource was never acquired.

use std::io;

use drm::buffer::{Buffer, DrmFourcc};
use drm::control::dumbbuffer::{DumbBuffer, DumbMapping};
use drm::control::{framebuffer, Device as ControlDevice};
use tracing::{debug, warn};

use super::device::Card;
use super::error::CaptureError;
use crate::encode::FrameLayout;

/// Storage bits per pixel of the scratch allocation.
const BPP: u32 = 32;

/// Visible color depth registered with the device; the fourth byte of
/// each XRGB8888 pixel is padding.
const DEPTH: u32 = 24;

/// A device-memory pixel buffer sized to one display mode.
pub struct ScratchBuffer {
    buffer: Option<DumbBuffer>,
    fb: Option<framebuffer::Handle>,
    width: u32,
    height: u32,
    pitch: u32,
}

impl ScratchBuffer {
    /// Allocate a dumb buffer of the given dimensions at 32 bpp.
    ///
    /// The row pitch is whatever the device reports; it may exceed
    /// `width * 4` due to alignment and must be used for all row math.
    pub fn allocate(card: &Card, width: u32, height: u32) -> Result<Self, CaptureError> {
        let buffer = card
            .create_dumb_buffer((width, height), DrmFourcc::Xrgb8888, BPP)
            .map_err(|source| CaptureError::Allocation {
                width,
                height,
                source,
            })?;
        let pitch = buffer.pitch();
        debug!("allocated {}x{} dumb buffer, pitch {} bytes", width, height, pitch);
        Ok(Self {
            buffer: Some(buffer),
            fb: None,
            width,
            height,
            pitch,
        })
    }

    /// Register the allocation as a displayable framebuffer (depth 24 in
    /// 32 bpp storage).
    ///
    /// Not strictly needed for capture-to-file, but it makes the device
    /// validate the format it would scan out.  On failure the allocation
    /// stays owned by `self` and is freed by [`ScratchBuffer::release`].
    pub fn register(&mut self, card: &Card) -> Result<(), CaptureError> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| CaptureError::Registration { source: released() })?;
        let fb = card
            .add_framebuffer(buffer, DEPTH, BPP)
            .map_err(|source| CaptureError::Registration { source })?;
        debug!("registered framebuffer {:?}", fb);
        self.fb = Some(fb);
        Ok(())
    }

    /// Map the allocation into process memory.
    ///
    /// The device first prepares the buffer for mapping, then the region
    /// is mmapped with the byte size the kernel reported at allocation
    /// time; the mapping remembers that size and unmaps itself on drop.
    pub fn map<'a>(&'a mut self, card: &Card) -> Result<DumbMapping<'a>, CaptureError> {
        let buffer = self
            .buffer
            .as_mut()
            .ok_or_else(|| CaptureError::Map { source: released() })?;
        card.map_dumb_buffer(buffer)
            .map_err(|source| CaptureError::Map { source })
    }

    /// Row layout for the encoder.
    pub fn layout(&self) -> FrameLayout {
        FrameLayout {
            width: self.width,
            height: self.height,
            stride: self.pitch,
        }
    }

    /// Tear down everything still acquired: framebuffer registration
    /// first, then the allocation.  Safe to call whatever subset of
    /// the lifecycle succeeded, and safe to call more than once.
    pub fn release(&mut self, card: &Card) {
        if let Some(fb) = self.fb.take() {
            if let Err(err) = card.destroy_framebuffer(fb) {
                warn!("failed to remove framebuffer: {}", err);
            }
        }
        if let Some(buffer) = self.buffer.take() {
            if let Err(err) = card.destroy_dumb_buffer(buffer) {
                warn!("failed to destroy dumb buffer: {}", err);
            }
        }
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        if self.buffer.is_some() || self.fb.is_some() {
            warn!("scratch buffer dropped without release; device allocation leaked");
        }
    }
}

fn released() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "scratch buffer already released")
}
