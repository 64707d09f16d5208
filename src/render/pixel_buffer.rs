use std::path::Path;

use image::RgbImage;

use crate::error::{RenderError, Result};
use crate::math::Rgb;

/// Display gamma applied when quantizing to 8 bits.
const GAMMA: f64 = 2.2;

/// Row-major buffer of linear RGB pixels, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    /// Creates a buffer with every pixel set to `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<Rgb>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Linear colour of pixel `(x, y)`.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<&Rgb> {
        if x < self.width && y < self.height {
            self.pixels.get(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// All pixels, row-major.
    #[must_use]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Quantizes to 8-bit RGB with gamma 2.2; channels are clamped to `[0, 1]`
    /// first.
    #[must_use]
    pub fn to_rgb8(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let color = self.get(x, y).copied().unwrap_or_else(Rgb::zeros);
            image::Rgb([
                quantize(color.x),
                quantize(color.y),
                quantize(color.z),
            ])
        })
    }

    /// Writes the image to `path`; the format follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ImageWrite`] if the format is unsupported or the
    /// file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_rgb8()
            .save(path)
            .map_err(|source| RenderError::ImageWrite {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(channel: f64) -> u8 {
    let clamped = if channel.is_finite() {
        channel.clamp(0.0, 1.0)
    } else {
        0.0
    };
    (clamped.powf(1.0 / GAMMA) * 255.0).round() as u8
}
