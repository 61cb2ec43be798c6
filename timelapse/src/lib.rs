use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::debug;
use thiserror::Error;

use store::{Raster, Rect, Store, StoreError, Timestamp, Window};

#[derive(Debug, Error)]
pub enum ClipError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Replays one rectangle of canvas history as a sequence of rasters.
///
/// Construction does the two expensive steps once: a full reconstruction of
/// the starting frame, and a window over the rectangle and covered time
/// range. Every later frame replays only window events onto that base, so
/// per-frame cost is bounded by the window, not the whole history.
pub struct TimelapseClip<'a> {
    window: Window<'a>,
    base: Raster,
    rect: Rect,
    t0: Timestamp,
    /// Canvas seconds that pass per rendered second.
    speed: f64,
    /// Rendered length in seconds.
    duration: f64,
    /// Integer nearest-neighbor magnification.
    scale: u32,
}

impl<'a> TimelapseClip<'a> {
    /// `t0` defaults to the store's first event. `speed` and `duration` must
    /// be positive and `scale` at least 1.
    pub fn new(
        store: &'a Store,
        rect: Rect,
        t0: Option<Timestamp>,
        speed: f64,
        duration: f64,
        scale: u32,
    ) -> Result<Self, ClipError> {
        if !(speed > 0.0) {
            return Err(ClipError::InvalidArgument(format!(
                "speed must be positive, got {}",
                speed
            )));
        }
        if !(duration > 0.0) {
            return Err(ClipError::InvalidArgument(format!(
                "duration must be positive, got {}",
                duration
            )));
        }
        if scale == 0 {
            return Err(ClipError::InvalidArgument(
                "scale must be at least 1".to_string(),
            ));
        }

        let t0 = match t0.or_else(|| store.min_timestamp()) {
            Some(t0) => t0,
            None => {
                return Err(ClipError::InvalidArgument(
                    "store holds no events and no start timestamp was given".to_string(),
                ))
            }
        };

        let t_end = t0.add_seconds(speed * duration);
        let base = store.canvas_at(rect, t0, None)?;
        let window = store.create_window(rect, t0, t_end, Some("timelapse"))?;
        debug!(
            "clip window {} holds {} events over {}..{}",
            window.label(),
            window.num_events(),
            t0,
            t_end
        );

        Ok(TimelapseClip {
            window,
            base,
            rect,
            t0,
            speed,
            duration,
            scale,
        })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn t0(&self) -> Timestamp {
        self.t0
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// The raster at rendered time `tau` seconds. `tau <= 0` is the starting
    /// frame; times past the end freeze at the final state.
    pub fn frame_at(&self, tau: f64) -> Result<RgbaImage, ClipError> {
        let raster = if tau <= 0.0 {
            self.base.clone()
        } else {
            let t = self.t0.add_seconds(self.speed * tau);
            self.window.canvas_at(self.rect, t, Some(&self.base))?
        };

        Ok(self.magnify(raster.into_image()))
    }

    fn magnify(&self, image: RgbaImage) -> RgbaImage {
        if self.scale == 1 || image.width() == 0 || image.height() == 0 {
            return image;
        }
        // placements are hard-edged; never interpolate
        imageops::resize(
            &image,
            image.width() * self.scale,
            image.height() * self.scale,
            FilterType::Nearest,
        )
    }

    /// A finite, lazily evaluated pass over the clip at `fps` frames per
    /// rendered second, spanning rendered times `0..=duration`. Call again
    /// to restart from the beginning.
    pub fn frames(&self, fps: f64) -> Result<Frames<'_, 'a>, ClipError> {
        if !(fps > 0.0) {
            return Err(ClipError::InvalidArgument(format!(
                "fps must be positive, got {}",
                fps
            )));
        }

        Ok(Frames {
            clip: self,
            fps,
            next: 0,
            last: (self.duration * fps).floor() as u64,
        })
    }
}

/// Iterator over a clip's frames in rendered-time order.
pub struct Frames<'c, 'a> {
    clip: &'c TimelapseClip<'a>,
    fps: f64,
    next: u64,
    last: u64,
}

impl<'c, 'a> Iterator for Frames<'c, 'a> {
    type Item = Result<RgbaImage, ClipError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.last {
            return None;
        }
        let tau = self.next as f64 / self.fps;
        self.next += 1;
        Some(self.clip.frame_at(tau))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last + 1 - self.next) as usize;
        (remaining, Some(remaining))
    }
}
