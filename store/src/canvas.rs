use image::{Rgba, RgbaImage};

use crate::dictionary::ColorDictionary;
use crate::errors::StoreError;
use crate::index::{self, PositionIndex};
use crate::structures::{PixelEvent, Rect};
use crate::timestamp::Timestamp;

/// Color of every cell no event has touched yet.
pub const BACKGROUND: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Canvas state over one rectangle at one instant.
///
/// Carries its rectangle and reference time so it can serve as the base of an
/// incremental `canvas_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: RgbaImage,
    rect: Rect,
    at: Timestamp,
}

impl Raster {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn at(&self) -> Timestamp {
        self.at
    }
}

pub(crate) fn resolve_pixel(
    events: &[PixelEvent],
    index: &PositionIndex,
    colors: &ColorDictionary,
    x: u16,
    y: u16,
    t: Timestamp,
) -> Rgba<u8> {
    index
        .latest_at_or_before(events, x, y, t)
        .and_then(|event| colors.rgba(event.color_id))
        .unwrap_or(BACKGROUND)
}

/// Shared implementation of `canvas_at` for the store and for windows.
pub(crate) fn canvas_at(
    events: &[PixelEvent],
    index: &PositionIndex,
    colors: &ColorDictionary,
    rect: Rect,
    t: Timestamp,
    base: Option<&Raster>,
) -> Result<Raster, StoreError> {
    match base {
        None => Ok(render_full(events, index, colors, rect, t)),
        Some(base) => {
            if base.rect != rect {
                return Err(StoreError::InvalidArgument(
                    "base raster covers a different rectangle".to_string(),
                ));
            }
            if t < base.at {
                return Err(StoreError::InvalidArgument(
                    "base raster is newer than the query time".to_string(),
                ));
            }
            Ok(overlay(events, colors, base, t))
        }
    }
}

/// Full reconstruction: every cell resolved independently through the index.
fn render_full(
    events: &[PixelEvent],
    index: &PositionIndex,
    colors: &ColorDictionary,
    rect: Rect,
    t: Timestamp,
) -> Raster {
    let mut image = RgbaImage::from_pixel(rect.w as u32, rect.h as u32, BACKGROUND);
    for dy in 0..rect.h as u32 {
        for dx in 0..rect.w as u32 {
            // cells past the u16 coordinate space can hold no events
            let cx = match u16::try_from(rect.x as u32 + dx) {
                Ok(cx) => cx,
                Err(_) => continue,
            };
            let cy = match u16::try_from(rect.y as u32 + dy) {
                Ok(cy) => cy,
                Err(_) => continue,
            };
            image.put_pixel(dx, dy, resolve_pixel(events, index, colors, cx, cy, t));
        }
    }
    Raster {
        image,
        rect,
        at: t,
    }
}

/// Incremental reconstruction: replay the events in `(base.at, t]` onto a
/// copy of the base. Events arrive ascending, so the last write per cell is
/// the one with the maximum timestamp, matching full reconstruction.
fn overlay(
    events: &[PixelEvent],
    colors: &ColorDictionary,
    base: &Raster,
    t: Timestamp,
) -> Raster {
    let rect = base.rect;
    let mut image = base.image.clone();
    for event in index::events_in(events, rect, base.at, t) {
        if let Some(color) = colors.rgba(event.color_id) {
            image.put_pixel(
                (event.x - rect.x) as u32,
                (event.y - rect.y) as u32,
                color,
            );
        }
    }
    Raster {
        image,
        rect,
        at: t,
    }
}
