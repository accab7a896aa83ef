//! # Image Loading
//!
//! Resolves an image source (a file path or a `data:` URI) to bytes and
//! prepares them for the page. Layout only needs the intrinsic size; the
//! PDF serializer needs the pixels. JPEG data passes through untouched
//! (DCTDecode), PNG is decoded to RGB plus an optional alpha channel for the
//! SMask.

use std::io::Cursor;

/// A loaded image ready for PDF embedding.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub pixel_data: ImagePixelData,
    pub width_px: u32,
    pub height_px: u32,
}

#[derive(Debug, Clone)]
pub enum ImagePixelData {
    /// Raw JPEG bytes, embedded with DCTDecode.
    Jpeg {
        data: Vec<u8>,
        color_space: JpegColorSpace,
    },
    /// width * height * 3 RGB bytes, plus width * height alpha bytes when
    /// any pixel is not fully opaque.
    Decoded { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

#[derive(Debug, Clone, Copy)]
pub enum JpegColorSpace {
    DeviceRGB,
    DeviceGray,
}

/// Load and decode an image.
pub fn load_image(src: &str) -> Result<LoadedImage, String> {
    let raw_bytes = read_source_bytes(src)?;
    decode_image_bytes(&raw_bytes)
}

/// Pixel dimensions without decoding the pixel data.
pub fn image_dimensions(src: &str) -> Result<(u32, u32), String> {
    let raw_bytes = read_source_bytes(src)?;
    image::io::Reader::new(Cursor::new(&raw_bytes))
        .with_guessed_format()
        .map_err(|e| format!("format detection error: {}", e))?
        .into_dimensions()
        .map_err(|e| format!("failed to read dimensions: {}", e))
}

fn read_source_bytes(src: &str) -> Result<Vec<u8>, String> {
    if let Some(rest) = src.strip_prefix("data:") {
        let comma_pos = rest
            .find(',')
            .ok_or_else(|| "invalid data URI: missing comma".to_string())?;
        if !rest[..comma_pos].ends_with(";base64") {
            return Err("data URI is not base64-encoded".to_string());
        }
        return base64_decode(&rest[comma_pos + 1..]);
    }

    std::fs::read(src).map_err(|e| format!("failed to read image file: {}", e))
}

fn base64_decode(input: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| format!("base64 decode error: {}", e))
}

fn decode_image_bytes(data: &[u8]) -> Result<LoadedImage, String> {
    match data {
        [0xFF, 0xD8, ..] => decode_jpeg(data),
        [0x89, b'P', b'N', b'G', ..] => decode_png(data),
        _ if data.len() < 4 => Err("image data too short".to_string()),
        _ => Err("unsupported image format (expected JPEG or PNG)".to_string()),
    }
}

fn decode_jpeg(data: &[u8]) -> Result<LoadedImage, String> {
    let (width, height) = image::io::Reader::with_format(Cursor::new(data), image::ImageFormat::Jpeg)
        .into_dimensions()
        .map_err(|e| format!("failed to read JPEG dimensions: {}", e))?;

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Jpeg {
            data: data.to_vec(),
            color_space: jpeg_color_space(data),
        },
        width_px: width,
        height_px: height,
    })
}

/// Component count from the first start-of-frame segment. One component is
/// grayscale; anything we can't read is treated as RGB.
fn jpeg_color_space(data: &[u8]) -> JpegColorSpace {
    let mut i = 2;
    while i + 3 < data.len() && data[i] == 0xFF {
        let marker = data[i + 1];
        let is_sof = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_sof {
            return match data.get(i + 9) {
                Some(1) => JpegColorSpace::DeviceGray,
                _ => JpegColorSpace::DeviceRGB,
            };
        }
        let segment = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        i += 2 + segment;
    }
    JpegColorSpace::DeviceRGB
}

fn decode_png(data: &[u8]) -> Result<LoadedImage, String> {
    let rgba = image::load_from_memory_with_format(data, image::ImageFormat::Png)
        .map_err(|e| format!("failed to decode PNG: {}", e))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixel_count = (width * height) as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }
    let opaque = alpha.iter().all(|&a| a == 255);

    Ok(LoadedImage {
        pixel_data: ImagePixelData::Decoded {
            rgb,
            alpha: if opaque { None } else { Some(alpha) },
        },
        width_px: width,
        height_px: height,
    })
}
