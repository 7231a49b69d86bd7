//! Source resolution: turning anything image-shaped into an [`Image`].
//!
//! [`Source`] is a closed sum type; new kinds of source are added by
//! extending the enum, never by open-ended dynamic dispatch. Strings are
//! classified by prefix: `http…` (longer than the bare scheme) fetches over
//! the network, `data:image…` decodes inline base64, anything else is a
//! filesystem path.
//!
//! Byte and file sources are sniffed from their first 8 bytes only, then the
//! full stream is re-acquired for decoding. For a file handle that means
//! seeking back to offset 0 after the peek — skipping the rewind would feed
//! the decoder a truncated stream.

use crate::buffer::PixelBuffer;
use crate::codec;
use crate::error::Error;
use crate::img::Image;
use image::Rgba;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Everything [`load`] accepts, as one closed set.
#[derive(Debug)]
pub enum Source {
    /// A filesystem path, an `http(s)` URL or a `data:image` URI,
    /// classified by prefix at load time.
    Text(String),
    /// Encoded image bytes, sniffed before decoding.
    Bytes(Vec<u8>),
    /// An already-open file handle. Must be seekable; the handle is peeked
    /// and rewound before decoding.
    File(File),
    /// An already-decoded pixel buffer.
    Buffer(PixelBuffer),
    /// An existing image, passed through untouched.
    Image(Image),
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Text(text.to_string())
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::Text(text)
    }
}

impl From<&[u8]> for Source {
    fn from(bytes: &[u8]) -> Self {
        Source::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Source::Bytes(bytes)
    }
}

impl From<File> for Source {
    fn from(file: File) -> Self {
        Source::File(file)
    }
}

impl From<PixelBuffer> for Source {
    fn from(buffer: PixelBuffer) -> Self {
        Source::Buffer(buffer)
    }
}

impl From<Image> for Source {
    fn from(image: Image) -> Self {
        Source::Image(image)
    }
}

/// Resolve `source` into an [`Image`].
///
/// Never panics and never returns an error directly: a failed acquisition
/// comes back as an image already in the failed state, so the caller can
/// keep chaining and inspect the failure once at the end.
pub fn load(source: impl Into<Source>) -> Image {
    match source.into() {
        Source::Text(text) => load_from_text(&text),
        Source::Bytes(bytes) => load_from_bytes(&bytes),
        Source::File(file) => load_from_file(file),
        Source::Buffer(buffer) => load_from_buffer(buffer),
        Source::Image(image) => image,
    }
}

/// A blank, fully transparent canvas with png provenance.
pub fn canvas(width: u32, height: u32) -> Image {
    canvas_filled(width, height, Rgba([0, 0, 0, 0]))
}

/// A blank canvas filled with `color`.
pub fn canvas_filled(width: u32, height: u32, color: Rgba<u8>) -> Image {
    Image::from_canvas(PixelBuffer::filled(width, height, color))
}

fn load_from_text(text: &str) -> Image {
    if text.is_empty() {
        return Image::from_error(Error::EmptySource);
    }
    let bytes = text.as_bytes();
    if bytes.len() > 4 && &bytes[..4] == b"http" {
        load_from_url(text)
    } else if bytes.len() > 10 && &bytes[..10] == b"data:image" {
        load_from_data_uri(text)
    } else {
        load_from_path(Path::new(text))
    }
}

/// One blocking GET for the whole body, then sniff and decode. No retry, no
/// internal timeout; bounding the fetch is the caller's concern.
pub fn load_from_url(url: &str) -> Image {
    tracing::debug!(url, "fetching remote source");
    let body = match reqwest::blocking::get(url).and_then(|response| response.bytes()) {
        Ok(body) => body,
        Err(error) => return Image::from_error(Error::Http(error)),
    };
    let sniffed = match codec::sniff(&body[..body.len().min(8)]) {
        Ok(sniffed) => sniffed,
        Err(error) => return Image::from_error(error),
    };
    match codec::decode(&body, sniffed.format) {
        Ok(buffer) => Image::from_decoded(buffer, sniffed, None),
        // a body that sniffs but will not decode is not a usable source
        Err(_) => Image::from_error(Error::UnsupportedSource),
    }
}

pub fn load_from_path(path: &Path) -> Image {
    match File::open(path) {
        Ok(file) => load_from_file(file),
        Err(error) => Image::from_error(Error::Io(error)),
    }
}

/// Peek-then-rewind: read the first 8 bytes for sniffing, seek back to the
/// start, then hand the whole stream to the decoder.
pub fn load_from_file(mut file: File) -> Image {
    let mut prefix = [0u8; 8];
    let peeked = match file.read(&mut prefix) {
        Ok(n) => n,
        Err(error) => return Image::from_error(Error::Io(error)),
    };
    if let Err(error) = file.seek(SeekFrom::Start(0)) {
        return Image::from_error(Error::Io(error));
    }

    let sniffed = match codec::sniff(&prefix[..peeked]) {
        Ok(sniffed) => sniffed,
        Err(error) => return Image::from_error(error),
    };

    let mut body = Vec::new();
    if let Err(error) = file.read_to_end(&mut body) {
        return Image::from_error(Error::Io(error));
    }
    let filesize = file.metadata().ok().map(|meta| meta.len());

    match codec::decode(&body, sniffed.format) {
        Ok(buffer) => Image::from_decoded(buffer, sniffed, filesize),
        Err(error) => Image::from_error(error),
    }
}

pub fn load_from_bytes(bytes: &[u8]) -> Image {
    if bytes.is_empty() {
        return Image::from_error(Error::EmptySource);
    }
    let sniffed = match codec::sniff(&bytes[..bytes.len().min(8)]) {
        Ok(sniffed) => sniffed,
        Err(error) => return Image::from_error(error),
    };
    match codec::decode(bytes, sniffed.format) {
        Ok(buffer) => Image::from_decoded(buffer, sniffed, None),
        Err(error) => Image::from_error(error),
    }
}

fn load_from_buffer(buffer: PixelBuffer) -> Image {
    if buffer.is_empty() {
        return Image::from_error(Error::NilImage);
    }
    Image::from_canvas(buffer)
}

fn load_from_data_uri(uri: &str) -> Image {
    match codec::from_data_uri(uri) {
        Ok((buffer, sniffed)) => Image::from_decoded(buffer, sniffed, None),
        Err(error) => Image::from_error(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_fails_as_empty_source() {
        let image = load("");
        assert!(image.is_failed());
        assert!(matches!(
            image.failure().map(|f| f.first()),
            Some(Error::EmptySource)
        ));
        assert!(image.pixels().is_none());
    }

    #[test]
    fn empty_bytes_fail_as_empty_source() {
        let image = load(Vec::new());
        assert!(matches!(
            image.failure().map(|f| f.first()),
            Some(Error::EmptySource)
        ));
    }

    #[test]
    fn bare_scheme_is_treated_as_a_path() {
        // "http" alone is only four characters, so it falls through to the
        // filesystem branch and fails on open rather than on the network
        let image = load("http");
        assert!(matches!(
            image.failure().map(|f| f.first()),
            Some(Error::Io(_))
        ));
    }

    #[test]
    fn missing_path_fails_with_io_error() {
        let image = load("/nonexistent/image.png");
        assert!(image.is_failed());
        assert!(matches!(
            image.failure().map(|f| f.first()),
            Some(Error::Io(_))
        ));
    }

    #[test]
    fn unknown_bytes_fail_as_unsupported_format() {
        let image = load(vec![0x00, 0x01, 0x02, 0x03]);
        assert!(matches!(
            image.failure().map(|f| f.first()),
            Some(Error::UnsupportedFormat)
        ));
    }

    #[test]
    fn png_bytes_decode_with_provenance() {
        let buffer = PixelBuffer::filled(3, 2, Rgba([9, 8, 7, 255]));
        let bytes = codec::encode(&buffer, "png", 100, false).unwrap();
        let image = load(bytes);
        assert!(!image.is_failed());
        assert_eq!(image.extension(), "png");
        assert_eq!(image.mimetype(), "image/png");
        assert_eq!((image.width(), image.height()), (3, 2));
    }

    #[test]
    fn zero_sized_buffer_fails_as_nil_image() {
        let image = load(PixelBuffer::new(0, 10));
        assert!(matches!(
            image.failure().map(|f| f.first()),
            Some(Error::NilImage)
        ));
    }

    #[test]
    fn decoded_buffer_loads_as_png_canvas() {
        let image = load(PixelBuffer::filled(4, 4, Rgba([1, 1, 1, 255])));
        assert!(!image.is_failed());
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn existing_image_passes_through() {
        let original = canvas(5, 5);
        let reloaded = load(original);
        assert!(!reloaded.is_failed());
        assert_eq!((reloaded.width(), reloaded.height()), (5, 5));
    }

    #[test]
    fn canvas_is_transparent_by_default() {
        let image = canvas(2, 2);
        let pixels = image.pixels().unwrap();
        assert_eq!(pixels.get(0, 0), Rgba([0, 0, 0, 0]));
    }
}
