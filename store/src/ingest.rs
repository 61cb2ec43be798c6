use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use log::{info, warn};
use tempfile::NamedTempFile;

use crate::constants::STORE_FILE_NAME;
use crate::errors::StoreError;
use crate::store_writer::StoreWriter;
use crate::timestamp::Timestamp;

/// The 2022 canvas history export is split across this many numbered files.
const SOURCE_FILE_COUNT: u32 = 79;

fn source_file_name(id: u32) -> String {
    format!("2022_place_canvas_history-{:012}.csv.gzip", id)
}

/// What a build processed. Fewer sources than expected is a warning carried
/// here, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub sources_found: u32,
    pub sources_expected: u32,
    pub records_read: u64,
    pub events_written: u64,
}

/// Builds the store file from the history exports in `data_dir`.
///
/// The archive is written through a temporary file and only persisted to
/// [`STORE_FILE_NAME`] once the build succeeds, so a malformed source never
/// leaves a half-written store behind.
pub fn build_store<P: AsRef<Path>>(data_dir: P) -> Result<BuildSummary, StoreError> {
    let data_dir = data_dir.as_ref();

    let sources: Vec<PathBuf> = (0..SOURCE_FILE_COUNT)
        .map(|id| data_dir.join(source_file_name(id)))
        .filter(|path| path.is_file())
        .collect();

    if sources.is_empty() {
        return Err(StoreError::NoSourceData(data_dir.to_path_buf()));
    }
    if (sources.len() as u32) < SOURCE_FILE_COUNT {
        warn!(
            "only {} of {} source files present, building from what exists",
            sources.len(),
            SOURCE_FILE_COUNT
        );
    }

    let store_path = data_dir.join(STORE_FILE_NAME);
    info!("building store at {}", store_path.display());

    let tmp = NamedTempFile::new_in(data_dir)?;
    let mut out = BufWriter::new(tmp.reopen()?);
    let mut writer = StoreWriter::new(&mut out)?;

    let mut records_read = 0u64;
    for path in &sources {
        records_read += ingest_source(path, &mut writer)?;
    }

    let events_written = writer.finalize()?;
    out.flush()?;
    drop(out);

    tmp.persist(&store_path)
        .map_err(|err| StoreError::Io(err.error))?;

    Ok(BuildSummary {
        sources_found: sources.len() as u32,
        sources_expected: SOURCE_FILE_COUNT,
        records_read,
        events_written,
    })
}

/// Ingests one gzipped CSV export; returns the number of data records read.
fn ingest_source<W: Write>(
    path: &Path,
    writer: &mut StoreWriter<'_, W>,
) -> Result<u64, StoreError> {
    info!("ingesting {}", path.display());

    let file = File::open(path)?;
    let decoder = MultiGzDecoder::new(BufReader::new(file));
    ingest_records(decoder, writer)
}

/// Ingests line-oriented records (header row first) from any reader. Split
/// out from the gzip plumbing so tests can feed plain CSV.
pub(crate) fn ingest_records<R: Read, W: Write>(
    input: R,
    writer: &mut StoreWriter<'_, W>,
) -> Result<u64, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let mut records_read = 0u64;
    for result in reader.records() {
        let record = result?;
        records_read += 1;

        let timestamp = Timestamp::parse_history(field(&record, 0)?)?;
        let actor = field(&record, 1)?;
        let color = field(&record, 2)?;
        let coordinates = field(&record, 3)?;

        match parse_coordinates(coordinates)? {
            CoordinateSpec::Point { x, y } => {
                writer.add_placement(timestamp, actor, color, x, y)?;
            }
            CoordinateSpec::Rect { x1, y1, x2, y2 } => {
                // moderation events cover every pixel of the inclusive rect
                for x in x1..=x2 {
                    for y in y1..=y2 {
                        writer.add_placement(timestamp, actor, color, x, y)?;
                    }
                }
            }
        }
    }

    Ok(records_read)
}

fn field<'r>(record: &'r csv::StringRecord, i: usize) -> Result<&'r str, StoreError> {
    record
        .get(i)
        .ok_or_else(|| StoreError::MalformedRecord(format!("{:?}", record)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CoordinateSpec {
    Point { x: u16, y: u16 },
    Rect { x1: u16, y1: u16, x2: u16, y2: u16 },
}

/// `"x,y"` is a point, `"x1,y1,x2,y2"` a moderation rectangle; anything else
/// is malformed.
fn parse_coordinates(raw: &str) -> Result<CoordinateSpec, StoreError> {
    let mut parts = [0u16; 4];
    let mut count = 0;

    for piece in raw.split(',') {
        if count == parts.len() {
            return Err(StoreError::CoordinateParse(raw.to_string()));
        }
        parts[count] = piece
            .trim()
            .parse::<u16>()
            .map_err(|_| StoreError::CoordinateParse(raw.to_string()))?;
        count += 1;
    }

    match count {
        2 => Ok(CoordinateSpec::Point {
            x: parts[0],
            y: parts[1],
        }),
        4 => Ok(CoordinateSpec::Rect {
            x1: parts[0],
            y1: parts[1],
            x2: parts[2],
            y2: parts[3],
        }),
        _ => Err(StoreError::CoordinateParse(raw.to_string())),
    }
}
