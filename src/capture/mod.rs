//! Framebuffer capture pipeline.
//!
//! The orchestration is a fixed sequence: open device, enumerate and
//! select an output, allocate and register a scratch buffer, map it,
//! encode, then release everything in reverse acquisition order.  A
//! failure at any step unwinds only what was acquired before it; nothing
//! is retried.

pub mod connector;
pub mod device;
pub mod dumb_buffer;
pub mod error;

pub use device::Card;
pub use error::CaptureError;

use std::path::PathBuf;

use drm::Device;
use tracing::{debug, info};

use dumb_buffer::ScratchBuffer;

/// Parameters of one capture run.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// DRM device node to open
    pub device: PathBuf,
    /// Connector name override; `None` means first active connector
    pub connector: Option<String>,
    /// Destination file, overwritten on each run
    pub output: PathBuf,
    /// JPEG quality, 1-100
    pub quality: u8,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct CaptureSummary {
    pub connector: String,
    pub mode: String,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
    pub file_bytes: u64,
}

/// Run the whole capture pipeline once.
pub fn capture_to_file(cfg: &CaptureConfig) -> Result<CaptureSummary, CaptureError> {
    let card = Card::open(&cfg.device)?;
    match card.get_driver() {
        Ok(driver) => info!(
            "opened {} (driver {}: {})",
            cfg.device.display(),
            driver.name().to_string_lossy(),
            driver.description().to_string_lossy()
        ),
        Err(err) => debug!("driver query failed: {}", err),
    }

    let outputs = connector::list_outputs(&card)?;
    let output = connector::select_output(&outputs, cfg.connector.as_deref())?;
    let mode = connector::choose_mode(output).ok_or(CaptureError::NoActiveConnector)?;
    info!(
        "capturing {} at {}x{} ({})",
        output.name, mode.width, mode.height, mode.name
    );

    let mut surface = ScratchBuffer::allocate(&card, mode.width, mode.height)?;
    let encoded = register_map_encode(&card, &mut surface, cfg);
    surface.release(&card);
    let file_bytes = encoded?;

    Ok(CaptureSummary {
        connector: output.name.clone(),
        mode: mode.name.clone(),
        width: mode.width,
        height: mode.height,
        output: cfg.output.clone(),
        file_bytes,
    })
    // `card` drops here (or on any `?` above), closing the descriptor
    // exactly once on every path.
}

/// The failable middle of the pipeline, split out so the caller can
/// release the surface regardless of where it stopped.  The mapping
/// borrows the surface and is unmapped before this function returns.
fn register_map_encode(
    card: &Card,
    surface: &mut ScratchBuffer,
    cfg: &CaptureConfig,
) -> Result<u64, CaptureError> {
    surface.register(card)?;
    let layout = surface.layout();
    let mut mapping = surface.map(card)?;
    let pixels: &[u8] = mapping.as_mut();
    crate::encode::write_jpeg(pixels, &layout, &cfg.output, cfg.quality)
}
