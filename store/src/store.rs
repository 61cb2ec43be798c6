use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use image::Rgba;
use log::info;
use mla::ArchiveReader;

use crate::canvas::{self, Raster};
use crate::constants::{BINCODE_CONFIG, STORE_FILE_NAME};
use crate::dictionary::{ActorDictionary, ColorDictionary};
use crate::errors::StoreError;
use crate::index::{self, PositionIndex};
use crate::ingest;
use crate::structures::{Meta, PixelEvent, Rect};
use crate::timestamp::Timestamp;
use crate::window::Window;

/// A frozen, fully indexed canvas history. All queries take `&self`; once
/// opened the store is never mutated, so concurrent readers need no locking.
pub struct Store {
    events: Vec<PixelEvent>,
    index: PositionIndex,
    actors: ActorDictionary,
    colors: ColorDictionary,
    min_timestamp: Option<Timestamp>,
    max_timestamp: Option<Timestamp>,
}

impl Store {
    /// Opens a built store file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = File::open(path.as_ref())?;
        let mut mla = ArchiveReader::new(file).map_err(StoreError::Archive)?;

        let meta: Meta = decode_inner_file(&mut mla, "meta")?;
        let actor_names: Vec<String> = decode_inner_file(&mut mla, "actors")?;
        let color_representations: Vec<String> = decode_inner_file(&mut mla, "colors")?;

        let actors = ActorDictionary::from_names(actor_names);
        let colors = ColorDictionary::from_representations(color_representations)?;

        let mut events: Vec<PixelEvent> = Vec::with_capacity(meta.num_events as usize);
        for chunk_id in 0..meta.num_chunks {
            let name = format!("events/{}", chunk_id);
            let mut chunk_file = match mla.get_file(name.clone()) {
                Ok(Some(chunk_file)) => chunk_file,
                Ok(None) => return Err(StoreError::MissingStoreFile(name)),
                Err(err) => return Err(StoreError::Archive(err)),
            };

            let mut buf = Vec::new();
            chunk_file.data.read_to_end(&mut buf)?;

            let mut cursor = Cursor::new(buf);
            while (cursor.position() as usize) < cursor.get_ref().len() {
                let event: PixelEvent =
                    bincode::decode_from_std_read(&mut cursor, BINCODE_CONFIG)
                        .map_err(|_| StoreError::Decode(name.clone()))?;
                events.push(event);
            }
        }

        if events.len() as u64 != meta.num_events {
            return Err(StoreError::Decode("events".to_string()));
        }

        // Chunks may have been flushed out of timestamp order; the indexes
        // are only valid over the sorted log. The sort is stable, so events
        // sharing a timestamp keep their ingestion order.
        events.sort_by_key(|e| e.timestamp);
        let index = PositionIndex::build(&events);

        let min_timestamp = events.first().map(|e| e.timestamp);
        let max_timestamp = events.last().map(|e| e.timestamp);

        Ok(Store {
            events,
            index,
            actors,
            colors,
            min_timestamp,
            max_timestamp,
        })
    }

    /// Opens the store inside `data_dir`, building it first from the raw
    /// history exports if it does not exist yet.
    pub fn from_dir<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        let store_path = data_dir.join(STORE_FILE_NAME);

        if !store_path.is_file() {
            let summary = ingest::build_store(data_dir)?;
            info!(
                "built store: {} events from {}/{} source files",
                summary.events_written, summary.sources_found, summary.sources_expected
            );
        }

        Self::open(store_path)
    }

    /// The event at `(x, y)` with the greatest timestamp `<= t`.
    pub fn latest_at_or_before(&self, x: u16, y: u16, t: Timestamp) -> Option<&PixelEvent> {
        self.index.latest_at_or_before(&self.events, x, y, t)
    }

    /// All events inside `rect` with timestamp in `(t_start, t_end]`,
    /// ascending by timestamp.
    pub fn events_in(
        &self,
        rect: Rect,
        t_start: Timestamp,
        t_end: Timestamp,
    ) -> impl Iterator<Item = &PixelEvent> {
        index::events_in(&self.events, rect, t_start, t_end)
    }

    pub fn min_timestamp(&self) -> Option<Timestamp> {
        self.min_timestamp
    }

    pub fn max_timestamp(&self) -> Option<Timestamp> {
        self.max_timestamp
    }

    pub fn num_events(&self) -> usize {
        self.events.len()
    }

    pub fn actors(&self) -> &ActorDictionary {
        &self.actors
    }

    pub fn colors(&self) -> &ColorDictionary {
        &self.colors
    }

    /// Effective color of one cell at time `t`; background where nothing has
    /// been placed, including coordinates outside the represented canvas.
    pub fn pixel_color_at(&self, x: u16, y: u16, t: Timestamp) -> Rgba<u8> {
        canvas::resolve_pixel(&self.events, &self.index, &self.colors, x, y, t)
    }

    /// Canvas state over `rect` at time `t`. With a `base` raster (state of
    /// the same rectangle at an earlier time) only the events in between are
    /// replayed; the result is identical to a full reconstruction.
    pub fn canvas_at(
        &self,
        rect: Rect,
        t: Timestamp,
        base: Option<&Raster>,
    ) -> Result<Raster, StoreError> {
        canvas::canvas_at(&self.events, &self.index, &self.colors, rect, t, base)
    }

    /// Copies the events in `rect x (t_start, t_end]` into a standalone
    /// indexed window for repeated in-range queries. The label is an opaque
    /// debug tag.
    pub fn create_window(
        &self,
        rect: Rect,
        t_start: Timestamp,
        t_end: Timestamp,
        label: Option<&str>,
    ) -> Result<Window<'_>, StoreError> {
        if t_end < t_start {
            return Err(StoreError::InvalidArgument(
                "window end precedes its start".to_string(),
            ));
        }

        let events: Vec<PixelEvent> = self.events_in(rect, t_start, t_end).copied().collect();
        Ok(Window::new(rect, t_start, t_end, label, events, &self.colors))
    }
}

fn decode_inner_file<T, R>(mla: &mut ArchiveReader<'_, R>, name: &str) -> Result<T, StoreError>
where
    T: bincode::Decode<()>,
    R: Read + std::io::Seek,
{
    let mut inner = match mla.get_file(name.to_string()) {
        Ok(Some(inner)) => inner,
        Ok(None) => return Err(StoreError::MissingStoreFile(name.to_string())),
        Err(err) => return Err(StoreError::Archive(err)),
    };

    bincode::decode_from_std_read(&mut inner.data, BINCODE_CONFIG)
        .map_err(|_| StoreError::Decode(name.to_string()))
}
