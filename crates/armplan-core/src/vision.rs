//! Cheap image statistics used to dress up the mock analysis.
//!
//! An uploaded image is decoded (honouring EXIF orientation), sanity-checked,
//! shrunk to at most 1024×1024, lightly enhanced and reduced to a handful of
//! numbers: mean color, luma brightness and contrast, and the share of pixels
//! sitting on a strong gradient. Those feed a guessed object count and a
//! lighting verdict. Rows and columns dense with edges near the image border
//! give a rough workspace boundary.

use crate::error::{ArmplanError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{imageops, DynamicImage, GenericImageView, ImageDecoder, ImageReader, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

pub const MAX_PROCESS_DIM: u32 = 1024;
pub const MIN_DIM: u32 = 100;
pub const MAX_DIM: u32 = 4096;

const LUMA: [f64; 3] = [0.2989, 0.5870, 0.1140];

const CONTRAST_FACTOR: f32 = 1.1;
const SHARPNESS_FACTOR: f32 = 1.1;
const SATURATION_FACTOR: f32 = 1.05;
/// 3×3 smoothing kernel the sharpness blend is measured against.
const SMOOTH_KERNEL: [f32; 9] = [
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    5.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
];
/// Fixed score reported with every boundary estimate.
const BOUNDARY_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingQuality {
    TooDark,
    TooBright,
    LowContrast,
    HighContrast,
    Good,
}

/// Pixel rows and columns where the usable workspace appears to start and end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceBoundaries {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub image_size: (u32, u32),
    pub mean_color_rgb: [f64; 3],
    pub brightness: f64,
    pub contrast: f64,
    pub edge_density: f64,
    pub estimated_object_count: u32,
    pub lighting_quality: LightingQuality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<WorkspaceBoundaries>,
}

/// Decode a base64 payload, optionally wrapped in a `data:` URL.
pub fn decode_image(data: &str, max_bytes: usize) -> Result<DynamicImage> {
    let encoded = match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| ArmplanError::ImageDecode("malformed data URL".into()))?,
        None => data,
    };

    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| ArmplanError::ImageDecode(e.to_string()))?;
    if bytes.len() > max_bytes {
        return Err(ArmplanError::ImageTooLarge {
            size: bytes.len(),
            limit: max_bytes,
        });
    }

    let decode_err = |e: &dyn std::fmt::Display| ArmplanError::ImageDecode(e.to_string());
    let mut decoder = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(&e))?
        .into_decoder()
        .map_err(|e| decode_err(&e))?;
    let orientation = decoder.orientation().map_err(|e| decode_err(&e))?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(|e| decode_err(&e))?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Reject images that are too small, too large, or extremely elongated.
pub fn validate_image(img: &DynamicImage) -> Result<()> {
    let (w, h) = img.dimensions();
    if w < MIN_DIM || h < MIN_DIM {
        return Err(ArmplanError::ImageRejected(format!("too small: {w}x{h}")));
    }
    if w > MAX_DIM || h > MAX_DIM {
        return Err(ArmplanError::ImageRejected(format!("too large: {w}x{h}")));
    }
    let aspect = f64::from(w) / f64::from(h);
    if !(0.1..=10.0).contains(&aspect) {
        return Err(ArmplanError::ImageRejected(format!(
            "extreme aspect ratio: {aspect:.2}"
        )));
    }
    Ok(())
}

/// Convert to RGB, shrink (aspect preserved) to fit the processing box, then
/// enhance.
pub fn prepare_image(img: &DynamicImage) -> RgbImage {
    let (w, h) = img.dimensions();
    let rgb = if w > MAX_PROCESS_DIM || h > MAX_PROCESS_DIM {
        tracing::debug!(width = w, height = h, "downscaling image for analysis");
        img.thumbnail(MAX_PROCESS_DIM, MAX_PROCESS_DIM).to_rgb8()
    } else {
        img.to_rgb8()
    };
    enhance_image(&rgb)
}

/// Slight contrast, sharpness and saturation boost. Each step blends the
/// image away from a degenerate version of itself by a small factor.
pub fn enhance_image(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();

    let mean_luma = {
        let n = (w as usize * h as usize).max(1) as f64;
        let sum: f64 = img.pixels().map(luma).sum();
        (sum / n).round() as u8
    };
    let gray = RgbImage::from_pixel(w, h, Rgb([mean_luma; 3]));
    let out = blend(&gray, img, CONTRAST_FACTOR);

    let smooth = imageops::filter3x3(&out, &SMOOTH_KERNEL);
    let out = blend(&smooth, &out, SHARPNESS_FACTOR);

    let desaturated = DynamicImage::ImageLuma8(DynamicImage::ImageRgb8(out.clone()).to_luma8())
        .to_rgb8();
    blend(&desaturated, &out, SATURATION_FACTOR)
}

/// `degenerate + factor·(image − degenerate)`, clamped per channel.
fn blend(degenerate: &RgbImage, image: &RgbImage, factor: f32) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let d = degenerate.get_pixel(x, y).0;
        let p = image.get_pixel(x, y).0;
        Rgb(std::array::from_fn(|c| {
            let v = f32::from(d[c]) + factor * (f32::from(p[c]) - f32::from(d[c]));
            v.round().clamp(0.0, 255.0) as u8
        }))
    })
}

fn luma(pixel: &Rgb<u8>) -> f64 {
    let [r, g, b] = pixel.0.map(f64::from);
    r * LUMA[0] + g * LUMA[1] + b * LUMA[2]
}

fn grayscale(img: &RgbImage) -> Vec<f64> {
    img.pixels().map(luma).collect()
}

pub fn extract_workspace_info(img: &RgbImage) -> WorkspaceInfo {
    let (w, h) = img.dimensions();
    let n = (w as usize * h as usize).max(1) as f64;

    let mut sums = [0f64; 3];
    for pixel in img.pixels() {
        for (sum, v) in sums.iter_mut().zip(pixel.0) {
            *sum += f64::from(v);
        }
    }
    let gray = grayscale(img);

    let (brightness, contrast) = mean_std(&gray);
    let edges = edge_mask(&gray, w as usize, h as usize);
    let edge_density = if edges.is_empty() {
        0.0
    } else {
        edges.iter().filter(|&&e| e).count() as f64 / edges.len() as f64
    };

    WorkspaceInfo {
        image_size: (w, h),
        mean_color_rgb: sums.map(|s| s / n),
        brightness,
        contrast,
        edge_density,
        estimated_object_count: estimate_object_count(edge_density),
        lighting_quality: assess_lighting(brightness, contrast),
        boundaries: boundaries_from_edges(&edges, w, h),
    }
}

/// Estimate the workspace boundary from edge-heavy rows and columns in the
/// outer quarters of the image. `None` for an empty image.
pub fn detect_workspace_boundaries(img: &RgbImage) -> Option<WorkspaceBoundaries> {
    let (w, h) = img.dimensions();
    let edges = edge_mask(&grayscale(img), w as usize, h as usize);
    boundaries_from_edges(&edges, w, h)
}

fn boundaries_from_edges(edges: &[bool], w: u32, h: u32) -> Option<WorkspaceBoundaries> {
    if w == 0 || h == 0 {
        return None;
    }
    let (wu, hu) = (w as usize, h as usize);
    let mut rows = vec![0f64; hu];
    let mut cols = vec![0f64; wu];
    for (i, &edge) in edges.iter().enumerate() {
        if edge {
            rows[i / wu] += 1.0;
            cols[i % wu] += 1.0;
        }
    }

    let threshold = |sums: &[f64]| {
        let (mean, std) = mean_std(sums);
        mean + std
    };
    let (row_t, col_t) = (threshold(&rows), threshold(&cols));

    // Leading edge: first peak in the first quarter. Trailing edge: last
    // peak after the three-quarter mark.
    let leading = |sums: &[f64], t: f64| (0..sums.len() / 4).find(|&i| sums[i] > t).unwrap_or(0);
    let trailing = |sums: &[f64], t: f64| {
        let n = sums.len();
        (3 * n / 4 + 1..n)
            .rev()
            .find(|&i| sums[i] > t)
            .unwrap_or(n - 1)
    };

    let top = leading(&rows, row_t) as u32;
    let bottom = trailing(&rows, row_t) as u32;
    let left = leading(&cols, col_t) as u32;
    let right = trailing(&cols, col_t) as u32;

    Some(WorkspaceBoundaries {
        top,
        bottom,
        left,
        right,
        width: right.saturating_sub(left),
        height: bottom.saturating_sub(top),
        confidence: BOUNDARY_CONFIDENCE,
    })
}

/// Pixels whose forward-difference gradient magnitude is more than two
/// standard deviations above the mean magnitude.
fn edge_mask(gray: &[f64], w: usize, h: usize) -> Vec<bool> {
    if gray.is_empty() {
        return Vec::new();
    }
    let mut magnitude = Vec::with_capacity(gray.len());
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let dx = if x + 1 < w { gray[i + 1] - gray[i] } else { 0.0 };
            let dy = if y + 1 < h { gray[i + w] - gray[i] } else { 0.0 };
            magnitude.push((dx * dx + dy * dy).sqrt());
        }
    }
    let (mean, std) = mean_std(&magnitude);
    let threshold = mean + 2.0 * std;
    magnitude.iter().map(|&m| m > threshold).collect()
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

pub fn estimate_object_count(edge_density: f64) -> u32 {
    match edge_density {
        d if d < 0.05 => 1,
        d if d < 0.10 => 2,
        d if d < 0.15 => 3,
        d if d < 0.20 => 4,
        d => ((d * 30.0) as u32).min(10),
    }
}

pub fn assess_lighting(brightness: f64, contrast: f64) -> LightingQuality {
    if brightness < 50.0 {
        LightingQuality::TooDark
    } else if brightness > 200.0 {
        LightingQuality::TooBright
    } else if contrast < 20.0 {
        LightingQuality::LowContrast
    } else if contrast > 80.0 {
        LightingQuality::HighContrast
    } else {
        LightingQuality::Good
    }
}
