//! Image handling for PDF documents

use crate::{PdfError, Result};
use image::{DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(PdfError::ImageError("Image data too short".to_string()));
    }

    if data[..3] == [0xFF, 0xD8, 0xFF] {
        return Ok(ImageFormat::Jpeg);
    }

    if data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A] {
        return Ok(ImageFormat::Png);
    }

    Err(PdfError::ImageError("Unknown image format".to_string()))
}

/// Image XObject for PDF embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space ("DeviceRGB", "DeviceGray")
    pub color_space: &'static str,
    /// PDF filter ("DCTDecode" for JPEG, "FlateDecode" for decoded rasters)
    pub filter: &'static str,
    /// Encoded image data
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Create an XObject from JPEG or PNG bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// Create XObject from JPEG data
    ///
    /// JPEG data is embedded as-is with the DCTDecode filter; only the
    /// header is read to learn dimensions and component count.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();

        let color_space = match decoder.color_type() {
            image::ColorType::L8 | image::ColorType::L16 => "DeviceGray",
            _ => "DeviceRGB",
        };

        Ok(Self {
            width,
            height,
            color_space,
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    /// Create XObject from PNG data
    ///
    /// PNG images are decoded and re-encoded as raw samples with FlateDecode.
    /// Alpha channels are blended with a white background.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        let (raw_data, color_space) = match color_type {
            image::ColorType::L8 | image::ColorType::L16 => {
                (image.to_luma8().into_raw(), "DeviceGray")
            }
            image::ColorType::La8 | image::ColorType::La16 => {
                let gray = image
                    .to_luma_alpha8()
                    .pixels()
                    .map(|p| blend_with_white(p[0], p[1]))
                    .collect();
                (gray, "DeviceGray")
            }
            image::ColorType::Rgba8 | image::ColorType::Rgba16 => {
                let rgb = image
                    .to_rgba8()
                    .pixels()
                    .flat_map(|p| {
                        [
                            blend_with_white(p[0], p[3]),
                            blend_with_white(p[1], p[3]),
                            blend_with_white(p[2], p[3]),
                        ]
                    })
                    .collect();
                (rgb, "DeviceRGB")
            }
            _ => (image.to_rgb8().into_raw(), "DeviceRGB"),
        };

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw_data)?;
        let data = encoder.finish()?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: "FlateDecode",
            data,
        })
    }

    /// Convert to lopdf Stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let mut dict = Dictionary::new();

        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set("ColorSpace", Object::Name(self.color_space.as_bytes().to_vec()));
        dict.set("BitsPerComponent", 8);
        dict.set("Filter", Object::Name(self.filter.as_bytes().to_vec()));
        dict.set("Length", self.data.len() as i64);

        // Already encoded; lopdf must not compress it a second time
        Stream::new(dict, self.data.clone()).with_compression(false)
    }
}

fn blend_with_white(value: u8, alpha: u8) -> u8 {
    let alpha = alpha as f32 / 255.0;
    (value as f32 * alpha + 255.0 * (1.0 - alpha)) as u8
}

/// Generate operators to draw an image
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x` - Left edge in points
/// * `y` - Bottom edge in points
/// * `width` - Image width in points
/// * `height` - Image height in points
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}
