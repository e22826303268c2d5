//! Pixel-level checks used to reject useless downloads and to tell real
//! visual changes from re-encodes.
//!
//! Both checks work on per-channel difference extrema. A single "any pixel
//! differs" bounding box is not enough: with a uniform alpha channel it
//! would hide differences in the colour channels.

use image::{ColorType, DynamicImage};

/// Minimum and maximum absolute difference seen on one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extrema {
    pub min: u32,
    pub max: u32,
}

impl Extrema {
    pub fn is_zero(&self) -> bool {
        self.min == 0 && self.max == 0
    }
}

/// True for the 1×1 tracking-pixel responses some CDNs return.
pub fn is_single_pixel(image: &DynamicImage) -> bool {
    image.width() == 1 && image.height() == 1
}

/// An image is blank when every channel of every pixel equals the pixel at
/// (0, 0).
pub fn is_blank(image: &DynamicImage) -> bool {
    let bytes = image.as_bytes();
    let pixel_len = image.color().bytes_per_pixel() as usize;
    if bytes.len() < pixel_len || pixel_len == 0 {
        return true;
    }
    let reference = bytes[..pixel_len].repeat(bytes.len() / pixel_len);
    channel_extrema(image.color(), bytes, &reference)
        .iter()
        .all(Extrema::is_zero)
}

/// Pixel equality. Images of different size or colour type never match.
pub fn images_are_same(a: &DynamicImage, b: &DynamicImage) -> bool {
    if a.width() != b.width() || a.height() != b.height() || a.color() != b.color() {
        return false;
    }
    channel_extrema(a.color(), a.as_bytes(), b.as_bytes())
        .iter()
        .all(Extrema::is_zero)
}

/// Per-channel extrema of `|left - right|` over two buffers of the same
/// colour type and length.
pub fn channel_extrema(color: ColorType, left: &[u8], right: &[u8]) -> Vec<Extrema> {
    let channels = color.channel_count() as usize;
    let pixel_len = color.bytes_per_pixel() as usize;
    if channels == 0 || pixel_len == 0 {
        return Vec::new();
    }
    let sample_len = pixel_len / channels;

    let mut extrema: Vec<Option<Extrema>> = vec![None; channels];
    for (left_px, right_px) in left
        .chunks_exact(pixel_len)
        .zip(right.chunks_exact(pixel_len))
    {
        for (channel, slot) in extrema.iter_mut().enumerate() {
            let start = channel * sample_len;
            let range = start..start + sample_len;
            let diff = sample_diff(&left_px[range.clone()], &right_px[range]);
            *slot = Some(match *slot {
                None => Extrema {
                    min: diff,
                    max: diff,
                },
                Some(current) => Extrema {
                    min: current.min.min(diff),
                    max: current.max.max(diff),
                },
            });
        }
    }

    extrema.into_iter().map(Option::unwrap_or_default).collect()
}

fn sample_diff(left: &[u8], right: &[u8]) -> u32 {
    match left.len() {
        1 => u32::from(left[0].abs_diff(right[0])),
        2 => {
            let l = u16::from_ne_bytes([left[0], left[1]]);
            let r = u16::from_ne_bytes([right[0], right[1]]);
            u32::from(l.abs_diff(r))
        }
        4 => {
            let l = f32::from_ne_bytes([left[0], left[1], left[2], left[3]]);
            let r = f32::from_ne_bytes([right[0], right[1], right[2], right[3]]);
            if l.to_bits() == r.to_bits() {
                0
            } else {
                ((l - r).abs().ceil() as u32).max(1)
            }
        }
        _ => u32::from(left != right),
    }
}
