use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use store::{Rect, Store, Timestamp};
use timelapse::TimelapseClip;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the event store from a directory of canvas history exports
    Build { data_dir: PathBuf },
    /// Render the canvas state over a rectangle at one instant
    Render {
        data_dir: PathBuf,
        out_file: PathBuf,
        #[clap(long)]
        x: u16,
        #[clap(long)]
        y: u16,
        #[clap(long)]
        w: u16,
        #[clap(long)]
        h: u16,
        /// UTC instant like "2022-04-01 10:00:00"; defaults to the final state
        #[clap(long, value_parser = parse_timestamp_arg)]
        at: Option<Timestamp>,
    },
    /// Write a timelapse of a rectangle as numbered PNG frames
    Frames {
        data_dir: PathBuf,
        out_dir: PathBuf,
        #[clap(long)]
        x: u16,
        #[clap(long)]
        y: u16,
        #[clap(long)]
        w: u16,
        #[clap(long)]
        h: u16,
        /// UTC start like "2022-04-01 10:00:00"; defaults to the first event
        #[clap(long, value_parser = parse_timestamp_arg)]
        start: Option<Timestamp>,
        /// Canvas seconds per rendered second: "normal", "fast" or a number
        #[clap(long, default_value = "normal", value_parser = parse_speed_arg)]
        speed: f64,
        /// Rendered length in seconds
        #[clap(long)]
        duration: f64,
        #[clap(long, default_value_t = 30.0)]
        fps: f64,
        /// Integer nearest-neighbor magnification
        #[clap(long, default_value_t = 1)]
        scale: u32,
    },
}

fn parse_timestamp_arg(value: &str) -> Result<Timestamp, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|dt| Timestamp::from_datetime(dt.and_utc()))
        .map_err(|err| format!("expected \"YYYY-MM-DD HH:MM:SS\": {}", err))
}

fn parse_speed_arg(value: &str) -> Result<f64, String> {
    match value {
        "normal" => Ok(1200.0),
        "fast" => Ok(12000.0),
        _ => value
            .parse::<f64>()
            .map_err(|err| format!("expected \"normal\", \"fast\" or a number: {}", err)),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build { data_dir } => {
            let summary = store::build_store(&data_dir).expect("Could not build store");
            println!(
                "processed {} of {} source files ({} records, {} events) into {}",
                summary.sources_found,
                summary.sources_expected,
                summary.records_read,
                summary.events_written,
                data_dir.join(store::STORE_FILE_NAME).display(),
            );
        }
        Commands::Render {
            data_dir,
            out_file,
            x,
            y,
            w,
            h,
            at,
        } => {
            let store = Store::from_dir(&data_dir).expect("Could not open store");
            let t = at
                .or_else(|| store.max_timestamp())
                .expect("Store holds no events; pass --at");

            let raster = store
                .canvas_at(Rect::new(x, y, w, h), t, None)
                .expect("Could not render canvas");
            raster
                .image()
                .save(&out_file)
                .expect("Could not save image");
            println!("wrote {}", out_file.display());
        }
        Commands::Frames {
            data_dir,
            out_dir,
            x,
            y,
            w,
            h,
            start,
            speed,
            duration,
            fps,
            scale,
        } => {
            let store = Store::from_dir(&data_dir).expect("Could not open store");
            let clip = TimelapseClip::new(
                &store,
                Rect::new(x, y, w, h),
                start,
                speed,
                duration,
                scale,
            )
            .expect("Could not set up timelapse");

            fs::create_dir_all(&out_dir).expect("Could not create output directory");

            let mut written = 0u64;
            for (i, frame) in clip.frames(fps).expect("Bad fps").enumerate() {
                let frame = frame.expect("Could not render frame");
                let path = out_dir.join(format!("frame_{:05}.png", i));
                frame.save(&path).expect("Could not save frame");
                written += 1;
            }
            println!("wrote {} frames to {}", written, out_dir.display());
        }
    }
}
