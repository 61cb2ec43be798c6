use image::Rgba;

use crate::canvas::{self, Raster};
use crate::dictionary::ColorDictionary;
use crate::errors::StoreError;
use crate::index::{self, PositionIndex};
use crate::structures::{PixelEvent, Rect};
use crate::timestamp::Timestamp;

/// A bounded, ephemeral slice of the event log: the events of one rectangle
/// and one `(start, end]` time range, carrying their own position index.
///
/// Owned by whoever created it and independent of the store apart from the
/// borrowed color dictionary; queries are scoped to the copied subset.
pub struct Window<'a> {
    rect: Rect,
    t_start: Timestamp,
    t_end: Timestamp,
    label: String,
    events: Vec<PixelEvent>,
    index: PositionIndex,
    colors: &'a ColorDictionary,
}

impl<'a> Window<'a> {
    pub(crate) fn new(
        rect: Rect,
        t_start: Timestamp,
        t_end: Timestamp,
        label: Option<&str>,
        events: Vec<PixelEvent>,
        colors: &'a ColorDictionary,
    ) -> Self {
        let index = PositionIndex::build(&events);
        Window {
            rect,
            t_start,
            t_end,
            label: sanitize_label(label.unwrap_or("window")),
            events,
            index,
            colors,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn t_start(&self) -> Timestamp {
        self.t_start
    }

    pub fn t_end(&self) -> Timestamp {
        self.t_end
    }

    /// Opaque tag distinguishing concurrent windows in logs; never
    /// interpreted.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    pub fn latest_at_or_before(&self, x: u16, y: u16, t: Timestamp) -> Option<&PixelEvent> {
        self.index.latest_at_or_before(&self.events, x, y, t)
    }

    pub fn events_in(
        &self,
        rect: Rect,
        t_start: Timestamp,
        t_end: Timestamp,
    ) -> impl Iterator<Item = &PixelEvent> {
        index::events_in(&self.events, rect, t_start, t_end)
    }

    /// Effective color within the window's subset; background where the
    /// subset holds nothing at or before `t`.
    pub fn pixel_color_at(&self, x: u16, y: u16, t: Timestamp) -> Rgba<u8> {
        canvas::resolve_pixel(&self.events, &self.index, self.colors, x, y, t)
    }

    /// Same contract as [`crate::Store::canvas_at`], scoped to the window's
    /// subset. The incremental form with a base raster from the window's
    /// start time reproduces the full log's canvas exactly.
    pub fn canvas_at(
        &self,
        rect: Rect,
        t: Timestamp,
        base: Option<&Raster>,
    ) -> Result<Raster, StoreError> {
        canvas::canvas_at(&self.events, &self.index, self.colors, rect, t, base)
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::sanitize_label;

    #[test]
    fn label_keeps_only_plain_characters() {
        assert_eq!(sanitize_label("frames_2022-04"), "frames_2022-04");
        assert_eq!(sanitize_label("x; DROP TABLE"), "x__DROP_TABLE");
    }
}
