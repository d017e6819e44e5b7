use std::sync::Mutex;

use chrono::{Days, NaiveDate};

use crate::{
    canvas::{meta::CanvasMeta, palette::Palette},
    compose::buffer::{OutputBuffer, Placement},
    engine::{
        pool::{build_thread_pool, run_batch},
        sink::FrameSink,
    },
    fetch::{
        fetcher::{CORRUPT_TIME_LABEL, Endpoints, OverlayTile, TileFetcher},
        transport::Connect,
    },
    foundation::{
        config::GrabConfig,
        core::{Region, Rgba8, TileCoord},
        error::{GrabError, GrabResult},
    },
    grid::mapper::TileGrid,
};

/// Calendar days to replay, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate, // inclusive
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> GrabResult<Self> {
        if start > end {
            return Err(GrabError::validation(format!(
                "history start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn len_days(self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            d.checked_add_days(Days::new(1)).filter(|next| *next <= end)
        })
    }
}

/// Counters reported after a history run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub days: u64,
    pub frames: u64,
    /// Days whose base snapshot came back blank and was replaced by the previous day.
    pub recovered_days: u64,
    /// Time labels dropped as corrupt or by the frame-skip stride.
    pub skipped_labels: u64,
}

/// Replays the backups of one region day by day, emitting a frame for each day start and for
/// each kept time slice.
///
/// The last time slice of a day is remembered and stands in for the next day's base snapshot if
/// that one comes back as a single color (every tile missing).
pub struct HistorySequencer<'a> {
    canvas_id: &'a str,
    canvas: &'a CanvasMeta,
    region: Region,
    cfg: &'a GrabConfig,
    background: Rgba8,
    previous_day: OutputBuffer,
    frame_no: u64,
    stats: HistoryStats,
}

impl<'a> HistorySequencer<'a> {
    pub fn new(
        cfg: &'a GrabConfig,
        canvas_id: &'a str,
        canvas: &'a CanvasMeta,
        region: Region,
    ) -> GrabResult<Self> {
        cfg.validate()?;
        canvas.ensure_2d()?;
        let background = Palette::from_rgb(&canvas.colors)?.background();
        Ok(Self {
            canvas_id,
            canvas,
            region,
            cfg,
            background,
            previous_day: OutputBuffer::filled(region, background),
            frame_no: 0,
            stats: HistoryStats::default(),
        })
    }

    pub fn stats(&self) -> HistoryStats {
        self.stats
    }

    /// Run every day of `days`, strictly in order.
    pub fn run(
        &mut self,
        connector: &dyn Connect,
        days: DayRange,
        sink: &mut dyn FrameSink,
    ) -> GrabResult<HistoryStats> {
        let pool = build_thread_pool(self.cfg.threads)?;
        let endpoints = Endpoints::from_config(self.cfg);
        for date in days.days() {
            let session = connector.connect()?;
            let fetcher = TileFetcher::new(
                session.as_ref(),
                &endpoints,
                self.cfg.tile_retry,
                self.cfg.metadata_retry,
            );
            self.run_day(date, &fetcher, &pool, sink)?;
        }
        Ok(self.stats)
    }

    #[tracing::instrument(skip(self, fetcher, pool, sink), fields(canvas = self.canvas_id))]
    fn run_day(
        &mut self,
        date: NaiveDate,
        fetcher: &TileFetcher<'_>,
        pool: &rayon::ThreadPool,
        sink: &mut dyn FrameSink,
    ) -> GrabResult<()> {
        let size = self.canvas.size_on(date);
        let grid = TileGrid::covering(self.region, size);
        let tiles = grid.tiles();
        tracing::info!(
            from = ?(grid.min.ix, grid.min.iy),
            to = ?(grid.max.ix, grid.max.iy),
            canvas_size = size,
            "getting frames for day"
        );

        let mut day_image = self.fetch_base(date, fetcher, pool, &grid, &tiles)?;
        if day_image.is_uniform() {
            tracing::warn!("got faulty full-backup frame, using last frame from previous day");
            day_image = self.previous_day.clone();
            self.stats.recovered_days += 1;
        }
        self.emit(&day_image, sink)?;

        let labels = fetcher.fetch_time_list(date, self.canvas_id)?;
        let frame_skip = self.cfg.frame_skip.max(1);
        for (i, label) in labels.iter().enumerate() {
            let n = i + 1;
            if n % frame_skip != 0 || label == CORRUPT_TIME_LABEL {
                self.stats.skipped_labels += 1;
                continue;
            }

            let frame = self.fetch_slice(date, label, &day_image, fetcher, pool, &grid, &tiles)?;
            tracing::info!(time = %label, "got time slice");
            self.emit(&frame, sink)?;
            if n == labels.len() {
                tracing::debug!("remembering last frame of day");
                self.previous_day = frame;
            }
        }

        self.stats.days += 1;
        Ok(())
    }

    /// Full-day snapshot. Every tile is required; missing ones become background.
    fn fetch_base(
        &self,
        date: NaiveDate,
        fetcher: &TileFetcher<'_>,
        pool: &rayon::ThreadPool,
        grid: &TileGrid,
        tiles: &[TileCoord],
    ) -> GrabResult<OutputBuffer> {
        let buffer = Mutex::new(OutputBuffer::new(self.region));
        let endpoints = fetcher.endpoints();
        run_batch(pool, tiles, &buffer, |t| {
            let url = endpoints.snapshot_tile(date, self.canvas_id, t);
            let origin = grid.tile_origin(t);
            let placement = match fetcher.fetch_overlay(&url, true)? {
                OverlayTile::Image(image) => Placement::Paste { origin, image },
                OverlayTile::Missing => Placement::Fill {
                    origin,
                    color: self.background,
                },
            };
            Ok(Some(placement))
        })?;
        tracing::info!("got start of day");
        buffer
            .into_inner()
            .map_err(|_| GrabError::fetch("output buffer lock poisoned"))
    }

    /// One incremental slice layered over a copy of the day's base image. Missing or failing
    /// tiles keep the base pixels.
    #[allow(clippy::too_many_arguments)]
    fn fetch_slice(
        &self,
        date: NaiveDate,
        label: &str,
        base: &OutputBuffer,
        fetcher: &TileFetcher<'_>,
        pool: &rayon::ThreadPool,
        grid: &TileGrid,
        tiles: &[TileCoord],
    ) -> GrabResult<OutputBuffer> {
        let buffer = Mutex::new(base.clone());
        let endpoints = fetcher.endpoints();
        run_batch(pool, tiles, &buffer, |t| {
            let url = endpoints.incremental_tile(date, self.canvas_id, label, t);
            match fetcher.fetch_overlay(&url, false) {
                Ok(OverlayTile::Image(image)) => Ok(Some(Placement::Paste {
                    origin: grid.tile_origin(t),
                    image,
                })),
                Ok(OverlayTile::Missing) => Ok(None),
                Err(err) => {
                    tracing::warn!(url, error = %err, "skipping tile");
                    Ok(None)
                }
            }
        })?;
        buffer
            .into_inner()
            .map_err(|_| GrabError::fetch("output buffer lock poisoned"))
    }

    fn emit(&mut self, frame: &OutputBuffer, sink: &mut dyn FrameSink) -> GrabResult<()> {
        self.frame_no += 1;
        self.stats.frames += 1;
        sink.write_frame(self.frame_no, &frame.materialize()?)
    }
}

/// Replay the history of `region` over `days`, handing every frame to `sink`.
pub fn download_history(
    connector: &dyn Connect,
    cfg: &GrabConfig,
    canvas_id: &str,
    canvas: &CanvasMeta,
    region: Region,
    days: DayRange,
    sink: &mut dyn FrameSink,
) -> GrabResult<HistoryStats> {
    HistorySequencer::new(cfg, canvas_id, canvas, region)?.run(connector, days, sink)
}

#[cfg(test)]
#[path = "../../tests/unit/engine/history.rs"]
mod tests;
