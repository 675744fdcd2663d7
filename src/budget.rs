use crate::codec::encode;
use crate::constants::{MAX_QUALITY, MIN_QUALITY, QUALITY_STEP};
use crate::error::Result;
use image::DynamicImage;
use tracing::debug;

/// Encoded bytes chosen by [`fit_to_budget`]
#[derive(Debug, Clone)]
pub struct FittedImage {
    pub bytes: Vec<u8>,
    pub quality: u8,
    pub attempts: usize,
}

impl FittedImage {
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn fits(&self, ceiling_bytes: u64) -> bool {
        self.len() <= ceiling_bytes
    }
}

/// Finds the highest quality, stepping down from 95 by 5, whose JPEG
/// encoding is no larger than `ceiling_bytes`.
///
/// If even quality 10 is over the ceiling, the quality-10 encoding is
/// returned anyway. The caller decides what a miss means.
///
/// # Arguments
/// * `image` - A normalized (RGB8 or L8) image
/// * `ceiling_bytes` - Maximum encoded size
///
/// # Returns
/// * `Ok(FittedImage)` - The chosen encoding, its quality and the number of encodes tried
/// * `Err(ResizeError)` - If the encoder fails
pub fn fit_to_budget(image: &DynamicImage, ceiling_bytes: u64) -> Result<FittedImage> {
    let mut quality = MAX_QUALITY;
    let mut bytes = encode(image, quality)?;
    let mut attempts = 1;

    while bytes.len() as u64 > ceiling_bytes && quality > MIN_QUALITY {
        quality = quality.saturating_sub(QUALITY_STEP).max(MIN_QUALITY);
        bytes = encode(image, quality)?;
        attempts += 1;
    }

    debug!(
        "Budget search settled on quality {} after {} attempt(s): {} bytes (ceiling {})",
        quality,
        attempts,
        bytes.len(),
        ceiling_bytes
    );

    Ok(FittedImage {
        bytes,
        quality,
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_ENCODE_ATTEMPTS;
    use image::{Rgb, RgbImage};

    fn noisy(width: u32, height: u32) -> DynamicImage {
        // xorshift noise defeats JPEG compression without pulling in rand
        let mut state: u32 = 0x9E37_79B9;
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        }))
    }

    #[test]
    fn test_generous_ceiling_keeps_max_quality() {
        let img = DynamicImage::new_rgb8(16, 16);
        let fitted = fit_to_budget(&img, u64::MAX).unwrap();
        assert_eq!(fitted.quality, MAX_QUALITY);
        assert_eq!(fitted.attempts, 1);
    }

    #[test]
    fn test_unreachable_ceiling_stops_at_min_quality() {
        let img = noisy(64, 64);
        let fitted = fit_to_budget(&img, 1).unwrap();
        assert_eq!(fitted.quality, MIN_QUALITY);
        assert_eq!(fitted.attempts, MAX_ENCODE_ATTEMPTS);
        assert!(!fitted.fits(1));
    }

    #[test]
    fn test_result_fits_when_reachable() {
        let img = noisy(96, 96);
        let at_max = fit_to_budget(&img, u64::MAX).unwrap();
        let at_min = fit_to_budget(&img, 1).unwrap();
        let ceiling = (at_max.len() + at_min.len()) / 2;

        let fitted = fit_to_budget(&img, ceiling).unwrap();
        assert!(fitted.fits(ceiling));
        assert!(fitted.quality < MAX_QUALITY);
        assert!(fitted.quality >= MIN_QUALITY);
        assert_eq!((MAX_QUALITY - fitted.quality) % QUALITY_STEP, 0);
    }

    #[test]
    fn test_attempts_match_quality_steps() {
        let img = noisy(48, 48);
        let fitted = fit_to_budget(&img, 2_000).unwrap();
        let expected = usize::from((MAX_QUALITY - fitted.quality) / QUALITY_STEP) + 1;
        assert_eq!(fitted.attempts, expected);
    }

    #[test]
    fn test_grayscale_input() {
        let img = DynamicImage::new_luma8(32, 32);
        let fitted = fit_to_budget(&img, 10 * 1024).unwrap();
        assert!(fitted.fits(10 * 1024));
    }
}
