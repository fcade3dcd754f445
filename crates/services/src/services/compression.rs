//! Image compression applied before an upload is stored.
//!
//! Images larger than the configured bounds are scaled down, keeping their
//! aspect ratio, and re-encoded in their original format. Documents pass
//! through untouched. Compression never fails an upload: on any decode or
//! encode error the original bytes are stored instead.

use std::io::Cursor;

use bytes::Bytes;
use image::{
    DynamicImage, ImageFormat,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType as PngFilter, PngEncoder},
        webp::WebPEncoder,
    },
    imageops::FilterType,
};
use thiserror::Error;

use super::upload_policy::{FileKind, ImageKind};

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy)]
pub struct CompressionOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    /// Keep the original when the image was not resized and re-encoding did
    /// not make it smaller.
    pub strict: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            strict: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compressed {
    pub data: Bytes,
    pub compression_applied: bool,
}

impl Compressed {
    fn original(data: Bytes) -> Self {
        Self {
            data,
            compression_applied: false,
        }
    }
}

/// Compress `data` on the blocking pool.
pub async fn compress(kind: FileKind, data: Bytes, options: CompressionOptions) -> Compressed {
    let FileKind::Image(image_kind) = kind else {
        return Compressed::original(data);
    };

    let input = data.clone();
    match tokio::task::spawn_blocking(move || compress_image(image_kind, &input, &options)).await {
        Ok(Ok(Some(output))) => {
            tracing::debug!(
                original_size = data.len(),
                compressed_size = output.len(),
                "Image compressed"
            );
            Compressed {
                data: Bytes::from(output),
                compression_applied: true,
            }
        }
        Ok(Ok(None)) => {
            tracing::debug!(size = data.len(), "Compression skipped, keeping original");
            Compressed::original(data)
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Image compression failed, storing original");
            Compressed::original(data)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Compression task panicked, storing original");
            Compressed::original(data)
        }
    }
}

/// Returns `Ok(None)` when the original should be kept.
pub fn compress_image(
    kind: ImageKind,
    data: &[u8],
    options: &CompressionOptions,
) -> Result<Option<Vec<u8>>, CompressionError> {
    let decoded = image::load_from_memory_with_format(data, image_format(kind))?;

    let needs_resize =
        decoded.width() > options.max_width || decoded.height() > options.max_height;
    let image = if needs_resize {
        decoded.resize(options.max_width, options.max_height, FilterType::Lanczos3)
    } else {
        decoded
    };

    let encoded = encode(kind, &image, options.jpeg_quality)?;

    if options.strict && !needs_resize && encoded.len() >= data.len() {
        return Ok(None);
    }

    Ok(Some(encoded))
}

fn image_format(kind: ImageKind) -> ImageFormat {
    match kind {
        ImageKind::Png => ImageFormat::Png,
        ImageKind::Jpeg => ImageFormat::Jpeg,
        ImageKind::Webp => ImageFormat::WebP,
    }
}

fn encode(kind: ImageKind, image: &DynamicImage, jpeg_quality: u8) -> Result<Vec<u8>, CompressionError> {
    let mut out = Cursor::new(Vec::new());
    match kind {
        ImageKind::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, jpeg_quality))?;
        }
        ImageKind::Png => {
            image.write_with_encoder(PngEncoder::new_with_quality(
                &mut out,
                CompressionType::Best,
                PngFilter::Adaptive,
            ))?;
        }
        ImageKind::Webp => {
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut out))?;
        }
    }
    Ok(out.into_inner())
}
