//! Borrowed, read-only views over decoded pixel buffers.
//!
//! An [`ImageView`] never owns or frees the pixels it points at: the caller keeps the
//! buffer alive for as long as the view is used.
use std::fmt::Display;

use image::{DynamicImage, GrayImage, ImageBuffer, RgbImage, RgbaImage};

use crate::error::{CvResult, MatchError};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Luma8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Luma8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    pub fn from_channels(channels: usize) -> Option<Self> {
        match channels {
            1 => Some(PixelFormat::Luma8),
            3 => Some(PixelFormat::Rgb8),
            4 => Some(PixelFormat::Rgba8),
            _ => None,
        }
    }
}

impl Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PixelFormat::Luma8 => "luma8",
            PixelFormat::Rgb8 => "rgb8",
            PixelFormat::Rgba8 => "rgba8",
        };
        f.write_str(s)
    }
}

/// A 2D pixel matrix borrowed from the caller.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    /// Bytes between the starts of two consecutive rows.
    stride: usize,
    format: PixelFormat,
}

impl<'a> ImageView<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> CvResult<Self> {
        let too_large = || MatchError::BufferTooSmall {
            expected: usize::MAX,
            actual: data.len(),
        };
        let row_len = (width as usize)
            .checked_mul(format.channels())
            .ok_or_else(too_large)?;
        if stride < row_len {
            return Err(MatchError::InvalidStride {
                stride,
                width,
                format,
            });
        }
        if width > 0 && height > 0 {
            let expected = stride
                .checked_mul(height as usize - 1)
                .and_then(|len| len.checked_add(row_len))
                .ok_or_else(too_large)?;
            if data.len() < expected {
                return Err(MatchError::BufferTooSmall {
                    expected,
                    actual: data.len(),
                });
            }
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// A view whose rows follow each other without padding.
    pub fn packed(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> CvResult<Self> {
        Self::new(data, width, height, width as usize * format.channels(), format)
    }

    /// Builds a view from a row-major array shape: `[h, w]` or `[h, w, channels]`.
    pub fn from_shape(shape: &[usize], data: &'a [u8]) -> CvResult<Self> {
        let (width, height, format) = image_shape(shape)?;
        Self::packed(data, width, height, format)
    }

    pub fn from_gray(image: &'a GrayImage) -> Self {
        Self::from_buffer(image.as_raw(), image.width(), image.height(), PixelFormat::Luma8)
    }

    pub fn from_rgb(image: &'a RgbImage) -> Self {
        Self::from_buffer(image.as_raw(), image.width(), image.height(), PixelFormat::Rgb8)
    }

    pub fn from_rgba(image: &'a RgbaImage) -> Self {
        Self::from_buffer(image.as_raw(), image.width(), image.height(), PixelFormat::Rgba8)
    }

    // `ImageBuffer` guarantees its raw buffer covers the packed layout.
    fn from_buffer(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            stride: width as usize * format.channels(),
            format,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Zero-area views are empty.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.format.channels()]
    }

    /// Copies the view into an owned 8-bit grayscale image.
    ///
    /// Colour views go through the `image` crate's luma conversion; the alpha channel is
    /// dropped.
    pub fn to_luma8(&self) -> CvResult<GrayImage> {
        let row_len = self.width as usize * self.format.channels();
        let mut packed = Vec::with_capacity(row_len * self.height as usize);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y));
        }

        let expected = packed.len();
        let too_small = || MatchError::BufferTooSmall {
            expected,
            actual: expected,
        };
        let gray = match self.format {
            PixelFormat::Luma8 => {
                ImageBuffer::from_raw(self.width, self.height, packed).ok_or_else(too_small)?
            }
            PixelFormat::Rgb8 => {
                let rgb: RgbImage =
                    ImageBuffer::from_raw(self.width, self.height, packed).ok_or_else(too_small)?;
                DynamicImage::ImageRgb8(rgb).into_luma8()
            }
            PixelFormat::Rgba8 => {
                let rgba: RgbaImage =
                    ImageBuffer::from_raw(self.width, self.height, packed).ok_or_else(too_small)?;
                DynamicImage::ImageRgba8(rgba).into_luma8()
            }
        };
        Ok(gray)
    }
}

/// Width, height and format of a `[h, w]` or `[h, w, channels]` array.
fn image_shape(shape: &[usize]) -> CvResult<(u32, u32, PixelFormat)> {
    let unsupported = || MatchError::UnsupportedShape(shape.to_vec());

    let (height, width, channels) = match *shape {
        [h, w] => (h, w, 1),
        [h, w, c] => (h, w, c),
        _ => return Err(unsupported()),
    };
    let format = PixelFormat::from_channels(channels).ok_or_else(unsupported)?;
    let width = u32::try_from(width).map_err(|_| unsupported())?;
    let height = u32::try_from(height).map_err(|_| unsupported())?;
    Ok((width, height, format))
}

/// Gathers an array of `shape` into the row-major layout [`ImageView::from_shape`] reads.
///
/// `element` is called with `[y, x]` or `[y, x, c]` in logical order, which lets arrays with
/// any memory layout (transposed, sliced with a step, reversed) be packed.
pub fn pack_pixels(shape: &[usize], mut element: impl FnMut(&[usize]) -> u8) -> CvResult<Vec<u8>> {
    let (width, height, format) = image_shape(shape)?;
    let (width, height, channels) = (width as usize, height as usize, format.channels());
    let len = width
        .checked_mul(height)
        .and_then(|len| len.checked_mul(channels))
        .ok_or_else(|| MatchError::UnsupportedShape(shape.to_vec()))?;

    let mut packed = Vec::with_capacity(len);
    for y in 0..height {
        for x in 0..width {
            if shape.len() == 2 {
                packed.push(element(&[y, x]));
            } else {
                for c in 0..channels {
                    packed.push(element(&[y, x, c]));
                }
            }
        }
    }
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgba};

    use super::*;

    #[test]
    fn test_from_shape() {
        let data = vec![0u8; 6 * 4 * 4];

        let view = ImageView::from_shape(&[6, 4], &data[..24]).unwrap();
        assert_eq!((view.width(), view.height()), (4, 6));
        assert_eq!(view.format(), PixelFormat::Luma8);

        let view = ImageView::from_shape(&[6, 4, 1], &data[..24]).unwrap();
        assert_eq!(view.format(), PixelFormat::Luma8);

        let view = ImageView::from_shape(&[6, 4, 3], &data[..72]).unwrap();
        assert_eq!(view.format(), PixelFormat::Rgb8);
        assert_eq!(view.stride(), 12);

        let view = ImageView::from_shape(&[6, 4, 4], &data).unwrap();
        assert_eq!(view.format(), PixelFormat::Rgba8);
    }

    #[test]
    fn test_from_shape_rejects_unsupported() {
        let data = vec![0u8; 64];
        assert_eq!(
            ImageView::from_shape(&[4, 4, 2], &data).unwrap_err(),
            MatchError::UnsupportedShape(vec![4, 4, 2])
        );
        assert!(matches!(
            ImageView::from_shape(&[64], &data),
            Err(MatchError::UnsupportedShape(_))
        ));
        assert!(matches!(
            ImageView::from_shape(&[2, 2, 2, 2], &data),
            Err(MatchError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn test_empty_views() {
        let view = ImageView::from_shape(&[0, 10], &[]).unwrap();
        assert!(view.is_empty());
        let view = ImageView::from_shape(&[10, 0, 4], &[]).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.to_luma8().unwrap().dimensions(), (0, 10));
    }

    #[test]
    fn test_stride_and_length_checks() {
        let data = vec![0u8; 10];
        assert!(matches!(
            ImageView::new(&data, 4, 2, 3, PixelFormat::Luma8),
            Err(MatchError::InvalidStride { stride: 3, .. })
        ));
        assert_eq!(
            ImageView::new(&data, 4, 3, 4, PixelFormat::Luma8).unwrap_err(),
            MatchError::BufferTooSmall {
                expected: 12,
                actual: 10
            }
        );
        // The last row does not need trailing padding.
        assert!(ImageView::new(&data, 4, 2, 6, PixelFormat::Luma8).is_ok());
    }

    #[test]
    fn test_huge_stride_is_rejected() {
        let data = [0u8; 4];
        for stride in [usize::MAX / 2 + 1, usize::MAX] {
            let err = ImageView::new(&data, 1, 3, stride, PixelFormat::Luma8).unwrap_err();
            assert_eq!(
                err,
                MatchError::BufferTooSmall {
                    expected: usize::MAX,
                    actual: 4
                }
            );
        }
        // A single row never reaches the stride.
        assert!(ImageView::new(&data, 4, 1, usize::MAX, PixelFormat::Luma8).is_ok());
    }

    #[test]
    fn test_pack_pixels_transposed() {
        // A 2x3 image stored column by column.
        #[rustfmt::skip]
        let columns = [
            1, 4,
            2, 5,
            3, 6,
        ];
        let packed = pack_pixels(&[2, 3], |i| columns[i[1] * 2 + i[0]]).unwrap();
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6]);

        let gray = ImageView::from_shape(&[2, 3], &packed)
            .unwrap()
            .to_luma8()
            .unwrap();
        assert_eq!(gray.get_pixel(2, 1), &Luma([6]));
    }

    #[test]
    fn test_pack_pixels_stepped_channels() {
        // Every other pixel of a 1x4 RGB row, as `array[:, ::2]` would see it.
        let row: Vec<u8> = (0..12).collect();
        let packed = pack_pixels(&[1, 2, 3], |i| row[i[1] * 2 * 3 + i[2]]).unwrap();
        assert_eq!(packed, vec![0, 1, 2, 6, 7, 8]);
        let view = ImageView::from_shape(&[1, 2, 3], &packed).unwrap();
        assert_eq!(view.format(), PixelFormat::Rgb8);
    }

    #[test]
    fn test_pack_pixels_rejects_unsupported() {
        assert_eq!(
            pack_pixels(&[3, 3, 2], |_| 0).unwrap_err(),
            MatchError::UnsupportedShape(vec![3, 3, 2])
        );
        assert_eq!(pack_pixels(&[0, 5], |_| 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_to_luma8_skips_row_padding() {
        #[rustfmt::skip]
        let data = [
            1, 2, 3, 99, 99,
            4, 5, 6, 99, 99,
        ];
        let view = ImageView::new(&data, 3, 2, 5, PixelFormat::Luma8).unwrap();
        let gray = view.to_luma8().unwrap();
        assert_eq!(gray.as_raw(), &vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_to_luma8_converts_colour() {
        let white = RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255]));
        let gray = ImageView::from_rgba(&white).to_luma8().unwrap();
        assert_eq!(gray.dimensions(), (3, 2));
        assert!(gray.pixels().all(|p| *p == Luma([255])));

        let black = RgbImage::new(2, 2);
        let gray = ImageView::from_rgb(&black).to_luma8().unwrap();
        assert!(gray.pixels().all(|p| *p == Luma([0])));
    }
}
