use std::io::Write;

use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Decoded raster image ready to be placed as a PDF image XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Packed 8-bit RGB samples, row by row.
    pub rgb: Vec<u8>,
    /// 8-bit alpha plane, present only when some pixel is not fully opaque.
    pub alpha: Option<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageDecodeError {
    #[error("value is not a data URI")]
    NotDataUri,
    #[error("data URI does not carry a base64 payload")]
    NotBase64,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("unsupported or corrupt image: {0}")]
    Image(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
}

impl RasterImage {
    /// Decodes PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageDecodeError> {
        let decoded = image::load_from_memory(bytes)?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageDecodeError::Empty);
        }

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        let mut translucent = false;
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            translucent |= a != u8::MAX;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        Ok(Self {
            width,
            height,
            rgb,
            alpha: translucent.then_some(alpha),
        })
    }

    /// Decodes a `data:image/<type>;base64,<payload>` URI as produced by a canvas.
    pub fn from_data_uri(uri: &str) -> Result<Self, ImageDecodeError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(ImageDecodeError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageDecodeError::NotDataUri)?;
        if !header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
            return Err(ImageDecodeError::NotBase64);
        }

        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
        Self::decode(&bytes)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    /// Placed size for a target width, shrunk further when taller than `max_height`.
    pub fn fit(&self, width: f32, max_height: f32) -> (f32, f32) {
        let height = width * self.aspect_ratio();
        if height <= max_height {
            (width, height)
        } else {
            (max_height / self.aspect_ratio(), max_height)
        }
    }
}

pub(crate) fn flate_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
