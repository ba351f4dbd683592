use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;

use crate::compression;
use crate::pdf_generator::{PdfGenerator, format_number};

/// Decoded image ready for embedding as an XObject
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub pixels: PixelData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Bmp,
}

impl ImageFormat {
    fn decoder_format(&self) -> ::image::ImageFormat {
        match self {
            ImageFormat::Jpeg => ::image::ImageFormat::Jpeg,
            ImageFormat::Png => ::image::ImageFormat::Png,
            ImageFormat::Bmp => ::image::ImageFormat::Bmp,
        }
    }
}

/// Stream payload of an image XObject
#[derive(Debug, Clone)]
pub enum PixelData {
    /// Original JPEG bytes, passed through with `/DCTDecode`
    Jpeg { data: Vec<u8>, gray: bool },
    /// Flate-compressed 8-bit RGB samples with an optional compressed alpha plane
    Flate { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// Detect format from raw bytes
pub fn detect_image_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 4 {
        return Err(anyhow!("Image data too short"));
    }
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        Ok(ImageFormat::Jpeg)
    } else if data[0] == 0x89 && data[1] == 0x50 && data[2] == 0x4E && data[3] == 0x47 {
        Ok(ImageFormat::Png)
    } else if data[0] == 0x42 && data[1] == 0x4D {
        Ok(ImageFormat::Bmp)
    } else {
        Err(anyhow!("Unsupported image format"))
    }
}

/// Load an image file and prepare its pixel data for embedding
pub fn load_image(path: &Path) -> Result<ImageInfo> {
    let data = fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    decode_image(data).with_context(|| format!("Failed to decode image {}", path.display()))
}

pub fn decode_image(data: Vec<u8>) -> Result<ImageInfo> {
    let format = detect_image_format(&data)?;
    let decoded = ::image::load_from_memory_with_format(&data, format.decoder_format())?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return Err(anyhow!("Image has zero size ({}x{})", width, height));
    }

    // Baseline gray/RGB JPEGs embed verbatim; CMYK and friends are re-encoded
    if format == ImageFormat::Jpeg {
        let gray = match decoded.color() {
            ::image::ColorType::L8 => Some(true),
            ::image::ColorType::Rgb8 => Some(false),
            _ => None,
        };
        if let Some(gray) = gray {
            return Ok(ImageInfo {
                format,
                width,
                height,
                pixels: PixelData::Jpeg { data, gray },
            });
        }
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    let mut alpha = Vec::with_capacity(width as usize * height as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let alpha = if has_alpha {
        Some(compression::compress_deflate(&alpha)?)
    } else {
        None
    };
    Ok(ImageInfo {
        format,
        width,
        height,
        pixels: PixelData::Flate {
            rgb: compression::compress_deflate(&rgb)?,
            alpha,
        },
    })
}

/// Display size of an image after fitting it into a bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedImage {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Fit an image to `target_width`, shrinking further when that would exceed
/// `max_height`.
///
/// The width-driven scale is tried first; if the resulting height is over the
/// limit, the scale is recomputed from the height instead. Both axes always
/// share one scale factor, so an image with an extreme aspect ratio
/// under-fills the other axis.
pub fn fit_image(
    natural_width: u32,
    natural_height: u32,
    target_width: f32,
    max_height: f32,
) -> Result<FittedImage> {
    if natural_width == 0 || natural_height == 0 {
        return Err(anyhow!(
            "Cannot fit an image with zero size ({}x{})",
            natural_width,
            natural_height
        ));
    }
    if !(target_width > 0.0 && max_height > 0.0) {
        return Err(anyhow!(
            "Bounding box must be positive, got {}x{}",
            target_width,
            max_height
        ));
    }

    let w = natural_width as f32;
    let h = natural_height as f32;
    let mut scale = target_width / w;
    let mut fitted = FittedImage {
        width: target_width,
        height: h * scale,
        scale,
    };
    if fitted.height > max_height {
        scale = max_height / h;
        fitted = FittedImage {
            width: (w * scale).min(target_width),
            height: max_height,
            scale,
        };
    }
    Ok(fitted)
}

/// Write the image XObject (plus its soft mask, if any) and return its id
pub fn create_image_object(generator: &mut PdfGenerator, info: &ImageInfo) -> u32 {
    match &info.pixels {
        PixelData::Jpeg { data, gray } => {
            let color_space = if *gray { "/DeviceGray" } else { "/DeviceRGB" };
            let dict = format!(
                "/Type /XObject\n/Subtype /Image\n/Width {}\n/Height {}\n\
                 /BitsPerComponent 8\n/ColorSpace {}\n/Filter /DCTDecode\n",
                info.width, info.height, color_space
            );
            generator.add_stream_object(dict, data.clone())
        }
        PixelData::Flate { rgb, alpha } => {
            let smask = alpha.as_ref().map(|plane| {
                let dict = format!(
                    "/Type /XObject\n/Subtype /Image\n/Width {}\n/Height {}\n\
                     /BitsPerComponent 8\n/ColorSpace /DeviceGray\n/Filter /FlateDecode\n",
                    info.width, info.height
                );
                generator.add_stream_object(dict, plane.clone())
            });
            let smask_entry = smask
                .map(|id| format!("/SMask {} 0 R\n", id))
                .unwrap_or_default();
            let dict = format!(
                "/Type /XObject\n/Subtype /Image\n/Width {}\n/Height {}\n\
                 /BitsPerComponent 8\n/ColorSpace /DeviceRGB\n/Filter /FlateDecode\n{}",
                info.width, info.height, smask_entry
            );
            generator.add_stream_object(dict, rgb.clone())
        }
    }
}

/// Create content stream that draws an image XObject
pub fn create_image_content_stream(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    image_name: &str,
) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(b"q\n");
    content.extend_from_slice(
        format!(
            "{} 0 0 {} {} {} cm\n",
            format_number(width),
            format_number(height),
            format_number(x),
            format_number(y)
        )
        .as_bytes(),
    );
    content.extend_from_slice(format!("/{} Do\n", image_name).as_bytes());
    content.extend_from_slice(b"Q\n");
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_detect_jpeg() {
        let data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert_eq!(detect_image_format(&data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_png() {
        let data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D];
        assert_eq!(detect_image_format(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_unknown() {
        let data = vec![0x00, 0x00, 0x00, 0x00];
        assert!(detect_image_format(&data).is_err());
    }

    #[test]
    fn test_fit_width_bound() {
        // 1000x500 into 512 wide, 300 tall -> width drives
        let fit = fit_image(1000, 500, 512.0, 300.0).unwrap();
        assert!((fit.width - 512.0).abs() < 0.01);
        assert!((fit.height - 256.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_height_bound() {
        // 400x800 into 512 wide, 237.6 tall -> height drives
        let fit = fit_image(400, 800, 512.0, 237.6).unwrap();
        assert!((fit.height - 237.6).abs() < 0.01);
        assert!((fit.width - 118.8).abs() < 0.01);
    }

    #[test]
    fn test_fit_upscales_small_images() {
        let fit = fit_image(100, 50, 400.0, 400.0).unwrap();
        assert!((fit.width - 400.0).abs() < 0.01);
        assert!((fit.height - 200.0).abs() < 0.01);
        assert!((fit.scale - 4.0).abs() < 0.0001);
    }

    #[test]
    fn test_fit_rejects_degenerate_input() {
        assert!(fit_image(0, 10, 100.0, 100.0).is_err());
        assert!(fit_image(10, 10, 0.0, 100.0).is_err());
        assert!(fit_image(10, 10, 100.0, -1.0).is_err());
    }

    fn png_bytes(img: &::image::DynamicImage) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ::image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_decode_opaque_png_has_no_alpha() {
        let img = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));
        let info = decode_image(png_bytes(&img.into())).unwrap();
        assert_eq!((info.width, info.height), (4, 3));
        match info.pixels {
            PixelData::Flate { rgb, alpha } => {
                assert!(alpha.is_none());
                let raw = compression::decompress_deflate(&rgb).unwrap();
                assert_eq!(raw.len(), 4 * 3 * 3);
                assert_eq!(&raw[..3], &[10, 20, 30]);
            }
            other => panic!("unexpected pixel data {:?}", other),
        }
    }

    #[test]
    fn test_decode_translucent_png_keeps_alpha() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 128]));
        let info = decode_image(png_bytes(&img.into())).unwrap();
        match info.pixels {
            PixelData::Flate { alpha: Some(plane), .. } => {
                let raw = compression::decompress_deflate(&plane).unwrap();
                assert_eq!(raw, vec![128; 4]);
            }
            other => panic!("expected an alpha plane, got {:?}", other),
        }
    }

    #[test]
    fn test_create_image_object_with_smask() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let info = decode_image(png_bytes(&img.into())).unwrap();
        let mut generator = PdfGenerator::new();
        let id = create_image_object(&mut generator, &info);
        // Soft mask is written first, the image references it
        assert_eq!(id, 2);
        let obj = &generator.objects[1];
        assert!(obj.content.contains("/SMask 1 0 R"));
        assert!(obj.content.contains("/Width 2"));
    }

    #[test]
    fn test_create_image_content_stream() {
        let cs = create_image_content_stream(100.0, 200.0, 300.0, 400.5, "Im1");
        let s = String::from_utf8(cs).unwrap();
        assert!(s.contains("q\n"));
        assert!(s.contains("300 0 0 400.5 100 200 cm"));
        assert!(s.contains("/Im1 Do"));
        assert!(s.contains("Q\n"));
    }
}
