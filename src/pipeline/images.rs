// src/pipeline/images.rs

//! Image recompression step, delegated to the `image` crate.
//!
//! JPEGs are re-encoded at the configured quality, PNGs at the highest
//! compression level. Formats without a lossless in-process story here
//! (SVG, animated GIF) pass through byte-for-byte.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use tracing::debug;

use crate::errors::StepError;
use crate::pipeline::step::Asset;

#[derive(Debug)]
pub struct ImageCompressor {
    jpeg_quality: u8,
}

impl ImageCompressor {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    pub fn apply(&self, asset: Asset) -> Result<Option<Asset>, StepError> {
        let ext = asset
            .rel
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let encoded = match ext.as_str() {
            "jpg" | "jpeg" => {
                let img = image::load_from_memory(&asset.contents)?;
                let mut buf = Vec::new();
                let encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
                img.write_with_encoder(encoder)?;
                buf
            }
            "png" => {
                let img = image::load_from_memory(&asset.contents)?;
                let mut buf = Vec::new();
                let encoder = PngEncoder::new_with_quality(
                    Cursor::new(&mut buf),
                    CompressionType::Best,
                    FilterType::Adaptive,
                );
                img.write_with_encoder(encoder)?;
                buf
            }
            other => {
                debug!(ext = %other, path = ?asset.rel, "no recompressor for format; copying");
                return Ok(Some(asset));
            }
        };

        // Recompression is only worth keeping when it actually shrank the file.
        if encoded.len() < asset.contents.len() {
            Ok(Some(Asset::new(asset.rel, encoded)))
        } else {
            Ok(Some(asset))
        }
    }
}
