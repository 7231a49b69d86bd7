//! Format sniffing and encode/decode glue over the `image` crate.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | **Sniff** | magic-number table below, no I/O |
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **Encode** | per-format encoders from `image::codecs` |
//! | **Inline transport** | `base64` standard alphabet, `data:image/...` URIs |
//!
//! Bitstream parsing never happens here; this module only routes bytes to
//! the right decoder and pixel buffers to the right encoder.

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, Rgba};
use std::io::Cursor;

/// Outcome of a successful sniff: what the bytes are and how to decode them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sniffed {
    pub extension: &'static str,
    pub mimetype: &'static str,
    pub format: ImageFormat,
}

/// One magic-number entry: any of the listed prefixes identifies the format.
type Magic = (
    &'static [&'static [u8]],
    &'static str,
    &'static str,
    ImageFormat,
);

/// Ordered sniff table, evaluated top to bottom; the first hit wins.
///
/// Keep it a list, not a map: the checks are prefix matches of different
/// lengths and their relative order is part of the detection contract.
/// gif and ico are deliberately absent.
const MAGIC_NUMBERS: &[Magic] = &[
    (&[&[0xFF, 0xD8]], "jpg", "image/jpeg", ImageFormat::Jpeg),
    (
        &[&[0x89, 0x50, 0x4E, 0x47]],
        "png",
        "image/png",
        ImageFormat::Png,
    ),
    (&[&[0x42, 0x4D]], "bmp", "image/x-ms-bmp", ImageFormat::Bmp),
    (
        &[&[0x49, 0x49], &[0x4D, 0x4D]],
        "tiff",
        "image/tiff",
        ImageFormat::Tiff,
    ),
    (&[&[0x52, 0x49]], "webp", "image/webp", ImageFormat::WebP),
];

/// Extensions accepted by save/export. Matching is case-sensitive.
pub const SAVE_FORMATS: &[&str] = &["png", "jpg", "jpeg", "tiff", "bmp"];

/// Classify encoded bytes by their magic-number prefix.
///
/// Only the first 8 bytes are ever inspected. Fails with
/// [`Error::UnsupportedFormat`] when fewer than 2 bytes are given or no
/// table entry matches.
pub fn sniff(prefix: &[u8]) -> Result<Sniffed> {
    if prefix.len() < 2 {
        return Err(Error::UnsupportedFormat);
    }
    for (magics, extension, mimetype, format) in MAGIC_NUMBERS {
        if magics.iter().any(|magic| prefix.starts_with(magic)) {
            return Ok(Sniffed {
                extension,
                mimetype,
                format: *format,
            });
        }
    }
    Err(Error::UnsupportedFormat)
}

/// Decode encoded bytes of a known format into a pixel buffer.
pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<PixelBuffer> {
    let decoded = image::load_from_memory_with_format(bytes, format)?;
    Ok(PixelBuffer::from_rgba_image(decoded.to_rgba8()))
}

/// Encode a pixel buffer into `format` (one of [`SAVE_FORMATS`]).
///
/// `quality` applies to jpeg only; values outside 1–99 fall back to 100.
/// When `grayscale` is set the samples are collapsed to a single luma
/// channel immediately before encoding — the in-memory buffer is untouched.
pub fn encode(buffer: &PixelBuffer, format: &str, quality: u8, grayscale: bool) -> Result<Vec<u8>> {
    let width = buffer.width();
    let height = buffer.height();
    let mut out = Cursor::new(Vec::new());

    // The bmp encoder has no single-channel mode, so grayscale bmp widens
    // the luma back out to rgb triplets.
    let (pixels, color): (Vec<u8>, ExtendedColorType) = match (format, grayscale) {
        ("bmp", true) => (
            luma_plane(buffer)
                .into_iter()
                .flat_map(|l| [l, l, l])
                .collect(),
            ExtendedColorType::Rgb8,
        ),
        (_, true) => (luma_plane(buffer), ExtendedColorType::L8),
        ("jpg" | "jpeg", false) => (rgb_plane(buffer), ExtendedColorType::Rgb8),
        (_, false) => (buffer.data().to_vec(), ExtendedColorType::Rgba8),
    };

    match format {
        "png" => PngEncoder::new(&mut out).write_image(&pixels, width, height, color)?,
        "jpg" | "jpeg" => {
            let quality = if (1..=99).contains(&quality) { quality } else { 100 };
            JpegEncoder::new_with_quality(&mut out, quality)
                .write_image(&pixels, width, height, color)?
        }
        "tiff" => TiffEncoder::new(&mut out).write_image(&pixels, width, height, color)?,
        "bmp" => BmpEncoder::new(&mut out).write_image(&pixels, width, height, color)?,
        other => return Err(Error::UnsupportedSaveFormat(other.to_string())),
    }

    Ok(out.into_inner())
}

/// Render a buffer as a `data:image/png;base64,...` URI.
pub fn to_data_uri(buffer: &PixelBuffer) -> Result<String> {
    let bytes = encode(buffer, "png", 100, false)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(&bytes)))
}

/// Decode an inline `data:image/<fmt>;base64,<payload>` URI.
///
/// The string is split on its first comma; the payload is base64-decoded
/// and then sniffed like any other byte source.
pub fn from_data_uri(uri: &str) -> Result<(PixelBuffer, Sniffed)> {
    let (_, payload) = uri.split_once(',').ok_or(Error::UnsupportedSource)?;
    let bytes = BASE64.decode(payload)?;
    let sniffed = sniff(&bytes[..bytes.len().min(8)])?;
    let buffer = decode(&bytes, sniffed.format)?;
    Ok((buffer, sniffed))
}

/// ITU-R 601 luma of one sample, the same weighting the grayscale
/// transform applies.
pub(crate) fn luma8(pixel: Rgba<u8>) -> u8 {
    let [r, g, b, _] = pixel.0;
    ((19595 * u32::from(r) + 38470 * u32::from(g) + 7471 * u32::from(b) + (1 << 15)) >> 16) as u8
}

fn luma_plane(buffer: &PixelBuffer) -> Vec<u8> {
    buffer
        .data()
        .chunks_exact(4)
        .map(|p| luma8(Rgba([p[0], p[1], p[2], p[3]])))
        .collect()
}

fn rgb_plane(buffer: &PixelBuffer) -> Vec<u8> {
    buffer
        .data()
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect()
}
