use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, GenericImageView};

use crate::config::ImageSettings;
use crate::error::FetchError;

use super::EmbeddedImage;

/// Size after clamping the longer edge to `max_edge`, keeping the aspect
/// ratio. Images already within bounds keep their size.
pub fn downscaled_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_edge || longer == 0 {
        return (width, height);
    }
    let scale = f64::from(max_edge) / f64::from(longer);
    let scaled = |edge: u32| ((f64::from(edge) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Decodes `bytes`, downscales them and re-encodes them as JPEG.
pub fn embed_image(bytes: &[u8], settings: &ImageSettings) -> Result<EmbeddedImage, FetchError> {
    let decoded = image::load_from_memory(bytes).map_err(FetchError::Decode)?;
    let (width, height) = decoded.dimensions();
    let (target_width, target_height) =
        downscaled_dimensions(width, height, settings.max_edge_px);

    let resized = if (target_width, target_height) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_width, target_height, FilterType::Triangle)
    };

    let rgb = resized.to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, settings.jpeg_quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(FetchError::Encode)?;

    Ok(EmbeddedImage::new(rgb.width(), rgb.height(), data))
}
