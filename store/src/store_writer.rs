use std::io::Write;

use mla::{config::ArchiveWriterConfig, ArchiveWriter};

use crate::constants::BINCODE_CONFIG;
use crate::dictionary::{ActorDictionary, ColorDictionary};
use crate::errors::StoreError;
use crate::structures::{Meta, PixelEvent};
use crate::timestamp::Timestamp;

// Events per chunk file; ~18 MiB encoded. Bounds peak memory during a build
// while keeping per-chunk overhead negligible.
const EVENTS_PER_CHUNK: usize = 1 << 20;

/// Writes a store archive: chunked event files plus the dictionaries and
/// meta, all interned on the fly. Chunks are flushed in arrival order, which
/// need not be timestamp order; the store sorts once at open.
pub struct StoreWriter<'a, W: Write> {
    mla: ArchiveWriter<'a, W>,
    actors: ActorDictionary,
    colors: ColorDictionary,
    buffer: Vec<PixelEvent>,
    chunks_written: u32,
    events_written: u64,
}

impl<'a, W: Write> StoreWriter<'a, W> {
    pub fn new(dest: W) -> Result<Self, StoreError> {
        let mut config = ArchiveWriterConfig::new();
        config.disable_layer(mla::Layers::ENCRYPT);
        let mla = ArchiveWriter::from_config(dest, config).map_err(StoreError::Archive)?;

        Ok(StoreWriter {
            mla,
            actors: ActorDictionary::new(),
            colors: ColorDictionary::new(),
            buffer: Vec::with_capacity(EVENTS_PER_CHUNK),
            chunks_written: 0,
            events_written: 0,
        })
    }

    /// Interns the actor and color strings and buffers one placement.
    pub fn add_placement(
        &mut self,
        timestamp: Timestamp,
        actor: &str,
        color: &str,
        x: u16,
        y: u16,
    ) -> Result<(), StoreError> {
        let actor_id = self.actors.intern(actor)?;
        let color_id = self.colors.intern(color)?;

        self.buffer.push(PixelEvent {
            timestamp,
            actor_id,
            color_id,
            x,
            y,
        });

        if self.buffer.len() >= EVENTS_PER_CHUNK {
            self.flush_chunk()?;
        }

        Ok(())
    }

    fn flush_chunk(&mut self) -> Result<(), StoreError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut chunk_buf = Vec::new();
        for event in &self.buffer {
            bincode::encode_into_std_write(event, &mut chunk_buf, BINCODE_CONFIG)
                .map_err(|_| StoreError::Encode("events".to_string()))?;
        }

        self.mla
            .add_file(
                format!("events/{}", self.chunks_written).as_str(),
                chunk_buf.len() as u64,
                chunk_buf.as_slice(),
            )
            .map_err(StoreError::Archive)?;

        self.chunks_written += 1;
        self.events_written += self.buffer.len() as u64;
        self.buffer.clear();

        Ok(())
    }

    /// Writes the dictionaries and meta and finalizes the archive. Returns
    /// the number of events written.
    pub fn finalize(mut self) -> Result<u64, StoreError> {
        self.flush_chunk()?;

        let mut actors_buf = Vec::new();
        bincode::encode_into_std_write(
            self.actors.names().to_vec(),
            &mut actors_buf,
            BINCODE_CONFIG,
        )
        .map_err(|_| StoreError::Encode("actors".to_string()))?;
        self.mla
            .add_file("actors", actors_buf.len() as u64, actors_buf.as_slice())
            .map_err(StoreError::Archive)?;

        let mut colors_buf = Vec::new();
        bincode::encode_into_std_write(
            self.colors.representations().to_vec(),
            &mut colors_buf,
            BINCODE_CONFIG,
        )
        .map_err(|_| StoreError::Encode("colors".to_string()))?;
        self.mla
            .add_file("colors", colors_buf.len() as u64, colors_buf.as_slice())
            .map_err(StoreError::Archive)?;

        let meta = Meta {
            num_events: self.events_written,
            num_chunks: self.chunks_written,
        };
        let mut meta_buf = Vec::new();
        bincode::encode_into_std_write(meta, &mut meta_buf, BINCODE_CONFIG)
            .map_err(|_| StoreError::Encode("meta".to_string()))?;
        self.mla
            .add_file("meta", meta_buf.len() as u64, meta_buf.as_slice())
            .map_err(StoreError::Archive)?;

        self.mla.finalize().map_err(StoreError::Archive)?;

        Ok(self.events_written)
    }
}
