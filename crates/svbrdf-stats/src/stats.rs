use crate::{StatsError, StatsResult};
use image::DynamicImage;
use std::path::Path;

/// Mean and population standard deviation over every sample of an image,
/// all channels flattened, both rounded to 6 decimal places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl PixelStats {
    pub fn from_path(path: impl AsRef<Path>) -> StatsResult<Self> {
        let image = load_image(path)?;
        Self::from_image(&image)
    }

    pub fn from_image(image: &DynamicImage) -> StatsResult<Self> {
        let samples = sample_values(image);
        if samples.is_empty() {
            return Err(StatsError::Empty);
        }

        let count = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / count;
        let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

        Ok(Self {
            mean: round6(mean),
            std_dev: round6(variance.sqrt()),
        })
    }
}

/// Average pixel value of the image at `path`.
pub fn average_value(path: impl AsRef<Path>) -> StatsResult<f64> {
    PixelStats::from_path(path).map(|stats| stats.mean)
}

/// Population standard deviation of pixel values of the image at `path`.
pub fn standard_deviation(path: impl AsRef<Path>) -> StatsResult<f64> {
    PixelStats::from_path(path).map(|stats| stats.std_dev)
}

pub fn load_image(path: impl AsRef<Path>) -> StatsResult<DynamicImage> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| StatsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&bytes)?;
    tracing::trace!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

// 8-bit samples stay 0..=255 and 16-bit greyscale stays 0..=65535. 16-bit
// colour and grey-alpha samples are reduced to their high byte, matching how
// Pillow opens those PNG modes.
fn sample_values(image: &DynamicImage) -> Vec<f64> {
    fn widen<T: Copy + Into<f64>>(raw: &[T]) -> Vec<f64> {
        raw.iter().map(|&v| v.into()).collect()
    }

    fn high_byte(raw: &[u16]) -> Vec<f64> {
        raw.iter().map(|&v| f64::from(v >> 8)).collect()
    }

    match image {
        DynamicImage::ImageLuma8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageLumaA8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageRgb8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageRgba8(buf) => widen(buf.as_raw()),
        DynamicImage::ImageLuma16(buf) => widen(buf.as_raw()),
        DynamicImage::ImageLumaA16(buf) => high_byte(buf.as_raw()),
        DynamicImage::ImageRgb16(buf) => high_byte(buf.as_raw()),
        DynamicImage::ImageRgba16(buf) => high_byte(buf.as_raw()),
        DynamicImage::ImageRgb32F(buf) => widen(buf.as_raw()),
        DynamicImage::ImageRgba32F(buf) => widen(buf.as_raw()),
        other => widen(other.to_rgba32f().as_raw()),
    }
}

// Exact ties go to the even digit.
fn round6(value: f64) -> f64 {
    (value * 1e6).round_ties_even() / 1e6
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{describe_normals, NormalsRoughness};
    use image::{GrayImage, ImageBuffer, Luma, LumaA, Rgb, RgbImage};

    #[test]
    fn test_uniform_gray() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([12])));
        let stats = PixelStats::from_image(&image).unwrap();
        assert_eq!(stats.mean, 12.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_channels_are_flattened() {
        // one pixel with samples 0, 10, 20 -> mean 10, population std sqrt(200/3)
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([0, 10, 20])));
        let stats = PixelStats::from_image(&image).unwrap();
        assert_eq!(stats.mean, 10.0);
        assert_eq!(stats.std_dev, 8.164966);
    }

    #[test]
    fn test_rounded_to_six_places() {
        // samples 0, 0, 1 -> mean 1/3
        let mut image = GrayImage::new(3, 1);
        image.put_pixel(2, 0, Luma([1]));
        let stats = PixelStats::from_image(&DynamicImage::ImageLuma8(image)).unwrap();
        assert_eq!(stats.mean, 0.333333);
        assert_eq!(stats.std_dev, 0.471405);
    }

    #[test]
    fn test_ties_round_to_even() {
        // 21 of 128 samples set -> mean 0.1640625 exactly
        let mut image = GrayImage::new(128, 1);
        for x in 0..21 {
            image.put_pixel(x, 0, Luma([1]));
        }
        let stats = PixelStats::from_image(&DynamicImage::ImageLuma8(image)).unwrap();
        assert_eq!(stats.mean, 0.164062);
    }

    #[test]
    fn test_sixteen_bit_gray_keeps_full_range() {
        let image = DynamicImage::ImageLuma16(ImageBuffer::from_pixel(2, 2, Luma([1000u16])));
        assert_eq!(PixelStats::from_image(&image).unwrap().mean, 1000.0);
    }

    #[test]
    fn test_sixteen_bit_gray_alpha_uses_high_byte() {
        let image = DynamicImage::ImageLumaA16(ImageBuffer::from_pixel(
            2,
            2,
            LumaA([0x1234u16, 0xffff]),
        ));
        // (0x12 + 0xff) / 2
        assert_eq!(PixelStats::from_image(&image).unwrap().mean, 136.5);
    }

    #[test]
    fn test_sixteen_bit_rgb_file_uses_high_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile_normals.png");
        ImageBuffer::<Rgb<u16>, Vec<u16>>::from_pixel(4, 4, Rgb([40000, 40000, 40000]))
            .save(&path)
            .unwrap();

        let mean = average_value(&path).unwrap();
        assert_eq!(mean, 156.0);
        assert_eq!(describe_normals(mean, 0.0), NormalsRoughness::Low);
    }

    #[test]
    fn test_empty_image() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(
            PixelStats::from_image(&image),
            Err(StatsError::Empty)
        ));
    }

    #[test]
    fn test_from_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample_specular.png");
        GrayImage::from_pixel(8, 8, Luma([17])).save(&path).unwrap();

        assert_eq!(average_value(&path).unwrap(), 17.0);
        assert_eq!(standard_deviation(&path).unwrap(), 0.0);
        // deterministic across decodes
        assert_eq!(average_value(&path).unwrap(), average_value(&path).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = average_value(dir.path().join("nope.png")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken_normals.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(average_value(&path), Err(StatsError::Decode(_))));
    }
}
