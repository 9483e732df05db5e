//! Saving the on-screen activity chart as a PNG image.

use egui::{ColorImage, Rect};
use image::{ImageBuffer, Rgba};
use std::path::Path;

/// Cut the chart region out of a full-window screenshot and write it to
/// `path` as PNG.
///
/// `rect` is the chart's on-screen rectangle in ui points; the screenshot is
/// in physical pixels, so the rect is scaled by `pixels_per_point` and
/// clamped to the screenshot bounds before cropping.
pub fn save_chart_region(
    screenshot: &ColorImage,
    rect: Rect,
    pixels_per_point: f32,
    path: &Path,
) -> Result<(), image::ImageError> {
    let region = chart_pixels(screenshot, rect, pixels_per_point);
    let bytes: Vec<u8> = region.pixels.iter().flat_map(|p| p.to_array()).collect();
    let Some(png) =
        ImageBuffer::<Rgba<u8>, _>::from_vec(region.size[0] as u32, region.size[1] as u32, bytes)
    else {
        return Err(image::ImageError::Parameter(
            image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ),
        ));
    };
    png.save(path)
}

fn chart_pixels(screenshot: &ColorImage, rect: Rect, pixels_per_point: f32) -> ColorImage {
    let [full_w, full_h] = screenshot.size;
    let scale = |v: f32, limit: usize| {
        (((v * pixels_per_point).round().max(0.0)) as usize).min(limit)
    };
    let left = scale(rect.min.x, full_w);
    let right = scale(rect.max.x, full_w);
    let top = scale(rect.min.y, full_h);
    let bottom = scale(rect.max.y, full_h);
    let width = right.saturating_sub(left);
    let height = bottom.saturating_sub(top);
    let pixels = (top..bottom)
        .flat_map(|row| {
            let offset = row * full_w + left;
            screenshot.pixels[offset..offset + width].iter().copied()
        })
        .collect();
    ColorImage {
        size: [width, height],
        pixels,
    }
}
