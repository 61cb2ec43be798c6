mod canvas;
mod constants;
mod dictionary;
mod errors;
mod index;
mod ingest;
mod store;
mod store_writer;
mod structures;
mod timestamp;
mod window;

pub use crate::canvas::{Raster, BACKGROUND};
pub use crate::constants::STORE_FILE_NAME;
pub use crate::dictionary::{ActorDictionary, ColorDictionary};
pub use crate::errors::StoreError;
pub use crate::ingest::{build_store, BuildSummary};
pub use crate::store::Store;
pub use crate::store_writer::StoreWriter;
pub use crate::structures::{Meta, PixelEvent, Rect};
pub use crate::timestamp::Timestamp;
pub use crate::window::Window;
