use std::io::Cursor;

use image::{ColorType, DynamicImage, ImageFormat};

use super::ExtractError;
use crate::ai::ImageInput;

/// Formats the drafting model accepts as inline data without conversion
const INLINE_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// Decode an uploaded image into inline model input.
///
/// PNG, JPEG and WebP keep their original bytes. Anything else (GIF, BMP,
/// TIFF) is re-encoded as PNG; animated GIFs keep their first frame.
pub fn decode_image(bytes: &[u8]) -> Result<ImageInput, ExtractError> {
    let format = image::guess_format(bytes).map_err(|e| ExtractError::ImageDecode(e.to_string()))?;
    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ExtractError::ImageDecode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());

    if INLINE_FORMATS.contains(&format) {
        return Ok(ImageInput {
            mime_type: format.to_mime_type().to_string(),
            data: bytes.to_vec(),
            width,
            height,
        });
    }

    Ok(ImageInput {
        mime_type: ImageFormat::Png.to_mime_type().to_string(),
        data: encode_png(decoded)?,
        width,
        height,
    })
}

fn encode_png(image: DynamicImage) -> Result<Vec<u8>, ExtractError> {
    // PNG has no floating-point color types
    let image = match image.color() {
        ColorType::Rgb32F | ColorType::Rgba32F => DynamicImage::ImageRgba8(image.to_rgba8()),
        _ => image,
    };

    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| ExtractError::ImageDecode(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    fn rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 30, 30])))
    }

    #[test]
    fn test_png_keeps_original_bytes() {
        let png = encode(rgb(4, 3), ImageFormat::Png);
        let input = decode_image(&png).unwrap();
        assert_eq!(input.mime_type, "image/png");
        assert_eq!((input.width, input.height), (4, 3));
        assert_eq!(input.data, png);
    }

    #[test]
    fn test_jpeg_keeps_original_bytes() {
        let jpeg = encode(rgb(8, 8), ImageFormat::Jpeg);
        let input = decode_image(&jpeg).unwrap();
        assert_eq!(input.mime_type, "image/jpeg");
        assert_eq!(input.data, jpeg);
    }

    #[test]
    fn test_gif_is_sent_as_png() {
        let gif = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]))),
            ImageFormat::Gif,
        );
        let input = decode_image(&gif).unwrap();

        assert_eq!(input.mime_type, "image/png");
        assert_eq!((input.width, input.height), (2, 2));
        assert_eq!(image::guess_format(&input.data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_bmp_is_decoded_and_sent_as_png() {
        let bmp = encode(rgb(1, 1), ImageFormat::Bmp);
        let input = decode_image(&bmp).unwrap();

        assert_eq!(input.mime_type, "image/png");
        assert_eq!((input.width, input.height), (1, 1));
        let roundtrip = image::load_from_memory(&input.data).unwrap();
        assert_eq!(roundtrip.to_rgb8().get_pixel(0, 0), &Rgb([200, 30, 30]));
    }

    #[test]
    fn test_corrupt_image_is_decode_error() {
        let err = decode_image(b"\x89PNG\r\n\x1a\nnot really").unwrap_err();
        assert!(matches!(err, ExtractError::ImageDecode(_)));

        let err = decode_image(b"no magic bytes at all").unwrap_err();
        assert!(matches!(err, ExtractError::ImageDecode(_)));
    }
}
