//! JPEG encoding of a mapped XRGB8888 frame.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb};
use tracing::debug;

use crate::capture::CaptureError;

/// Row layout of a mapped frame.
///
/// `stride` is the device-reported pitch and may exceed `width * 4`;
/// all row addressing goes through it, never through `width * 4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

impl FrameLayout {
    const BYTES_PER_PIXEL: usize = 4;

    /// Check the stride/size invariants against a mapped region of
    /// `len` bytes before any row is read.
    fn validate(&self, len: usize) -> Result<(), CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::BadLayout {
                detail: format!("degenerate dimensions {}x{}", self.width, self.height),
            });
        }
        let min_stride = self.width as usize * Self::BYTES_PER_PIXEL;
        if (self.stride as usize) < min_stride {
            return Err(CaptureError::BadLayout {
                detail: format!(
                    "stride {} is shorter than the {} bytes one row needs",
                    self.stride, min_stride
                ),
            });
        }
        let needed = self.stride as usize * self.height as usize;
        if needed > len {
            return Err(CaptureError::BadLayout {
                detail: format!("frame needs {} bytes but the mapping holds {}", needed, len),
            });
        }
        Ok(())
    }
}

/// Convert device rows to packed RGB, one row at a time.
///
/// XRGB8888 is laid out B, G, R, pad in memory on little-endian, so each
/// pixel drops its pad byte and swaps into R, G, B.  Rows are addressed
/// by stride; the padding tail past `width * 4` never enters the output.
fn xrgb_rows_to_rgb(pixels: &[u8], layout: &FrameLayout) -> Vec<u8> {
    let width = layout.width as usize;
    let height = layout.height as usize;
    let stride = layout.stride as usize;

    let mut rgb = Vec::with_capacity(width * height * 3);
    for row in pixels.chunks_exact(stride).take(height) {
        for px in row[..width * FrameLayout::BYTES_PER_PIXEL].chunks_exact(4) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    }
    rgb
}

/// Encode a mapped frame as a JPEG file at `path`, overwriting any
/// previous capture there.  Returns the written file size in bytes.
///
/// On encoding failure a partially written file may remain on disk;
/// callers wanting atomicity should encode to a temporary path and
/// rename.
///
/// The conversion materializes one packed-RGB copy of the frame while
/// the mapping is still live (the codec consumes a whole buffer, not
/// scanlines), so the image is briefly resident twice at `width *
/// height * 3` bytes extra.
pub fn write_jpeg(
    pixels: &[u8],
    layout: &FrameLayout,
    path: &Path,
    quality: u8,
) -> Result<u64, CaptureError> {
    layout.validate(pixels.len())?;

    let rgb = xrgb_rows_to_rgb(pixels, layout);
    let frame: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(layout.width, layout.height, rgb).ok_or_else(|| {
            CaptureError::BadLayout {
                detail: "converted frame does not match its dimensions".to_owned(),
            }
        })?;

    let file = File::create(path).map_err(|source| CaptureError::OutputFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(&frame)
        .map_err(|source| CaptureError::Encode { source })?;

    let file = writer
        .into_inner()
        .map_err(|err| CaptureError::OutputFile {
            path: path.to_path_buf(),
            source: err.into_error(),
        })?;
    let bytes = file
        .metadata()
        .map_err(|source| CaptureError::OutputFile {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    debug!(
        "encoded {}x{} JPEG (quality {}) to {} ({} bytes)",
        layout.width,
        layout.height,
        quality,
        path.display(),
        bytes
    );
    Ok(bytes)
}
