//! QR and Code-128 raster encoders
//!
//! Both encoders return PNG bytes held in memory and handed straight to the
//! PDF writer, so concurrent renders never share a file on disk.

use crate::{DocumentError, Result};
use image::{DynamicImage, ImageBuffer, Luma};
use std::io::Cursor;

/// Render a QR code for `payload` as PNG bytes
///
/// Medium error correction, at least 200x200 pixels with the standard quiet
/// zone.
pub fn generate_qr_png(payload: &str) -> Result<Vec<u8>> {
    use qrcode::{EcLevel, QrCode};

    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| DocumentError::RenderFailure(format!("QR encoding failed: {e}")))?;

    let image = code.render::<Luma<u8>>().min_dimensions(200, 200).build();
    encode_png(DynamicImage::ImageLuma8(image))
}

fn encode_png(image: DynamicImage) -> Result<Vec<u8>> {
    let mut bytes: Vec<u8> = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| DocumentError::RenderFailure(e.to_string()))?;
    Ok(bytes)
}

/// Turns an identity number into a barcode image
///
/// Implementations report failures as [`DocumentError::BarcodeEncoderFailure`];
/// the card composer replaces the image with a textual surrogate.
pub trait BarcodeEncoder: Send + Sync {
    /// Encode `payload` as PNG bytes
    fn encode_png(&self, payload: &str) -> Result<Vec<u8>>;
}

/// Bar/space widths of every Code-128 symbol, in modules
///
/// Index is the symbol value; 103..=105 are the start codes and 106 is the
/// stop pattern (which carries the final termination bar).
const CODE128_PATTERNS: [&str; 107] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232", "2331112",
];

const START_B: u8 = 104;
const START_C: u8 = 105;
const STOP: u8 = 106;

/// Quiet zone on each side, in modules
const QUIET_ZONE: u32 = 10;

/// Code-128 symbol values for `payload`, start and checksum included
///
/// All-digit payloads of even length use code set C (two digits per symbol);
/// anything else uses code set B, which covers printable ASCII.
pub fn code128_symbols(payload: &str) -> Result<Vec<u8>> {
    if payload.is_empty() {
        return Err(DocumentError::BarcodeEncoderFailure(
            "empty barcode payload".to_string(),
        ));
    }

    let bytes = payload.as_bytes();
    let mut symbols = Vec::with_capacity(bytes.len() + 3);

    if bytes.len() % 2 == 0 && bytes.iter().all(u8::is_ascii_digit) {
        symbols.push(START_C);
        for pair in bytes.chunks(2) {
            symbols.push((pair[0] - b'0') * 10 + (pair[1] - b'0'));
        }
    } else {
        symbols.push(START_B);
        for c in payload.chars() {
            if !(' '..='~').contains(&c) {
                return Err(DocumentError::BarcodeEncoderFailure(format!(
                    "character {c:?} cannot be encoded in Code-128 set B"
                )));
            }
            symbols.push(c as u8 - b' ');
        }
    }

    let weighted: u32 = symbols
        .iter()
        .enumerate()
        .map(|(i, &value)| value as u32 * (i as u32).max(1))
        .sum();
    symbols.push((weighted % 103) as u8);
    symbols.push(STOP);

    Ok(symbols)
}

/// Expand symbols into a bar/space module sequence (`true` = bar)
fn code128_modules(symbols: &[u8]) -> Vec<bool> {
    let mut modules = Vec::new();
    for &symbol in symbols {
        let pattern = CODE128_PATTERNS[symbol as usize];
        for (i, width) in pattern.bytes().enumerate() {
            let is_bar = i % 2 == 0;
            modules.extend(std::iter::repeat(is_bar).take((width - b'0') as usize));
        }
    }
    modules
}

/// Code-128 encoder producing a black-on-white raster
#[derive(Debug, Clone, Copy)]
pub struct Code128Encoder {
    /// Pixels per module
    pub module_width: u32,
    /// Bar height in pixels
    pub height: u32,
}

impl Default for Code128Encoder {
    fn default() -> Self {
        Self {
            module_width: 3,
            height: 80,
        }
    }
}

impl BarcodeEncoder for Code128Encoder {
    fn encode_png(&self, payload: &str) -> Result<Vec<u8>> {
        if self.module_width == 0 || self.height == 0 {
            return Err(DocumentError::BarcodeEncoderFailure(
                "barcode raster has zero size".to_string(),
            ));
        }

        let modules = code128_modules(&code128_symbols(payload)?);
        let total_modules = modules.len() as u32 + 2 * QUIET_ZONE;
        let width = total_modules * self.module_width;

        let image: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, self.height, |x, _| {
                let module = (x / self.module_width) as usize;
                let is_bar = module
                    .checked_sub(QUIET_ZONE as usize)
                    .and_then(|i| modules.get(i).copied())
                    .unwrap_or(false);
                if is_bar {
                    Luma([0])
                } else {
                    Luma([255])
                }
            });

        encode_png(DynamicImage::ImageLuma8(image)).map_err(|e| {
            DocumentError::BarcodeEncoderFailure(format!("cannot encode barcode image: {e}"))
        })
    }
}
