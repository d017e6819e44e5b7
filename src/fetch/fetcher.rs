use anyhow::Context;
use chrono::{Datelike, NaiveDate};

use crate::{
    canvas::meta::{ApiMe, day_key},
    fetch::{
        retry::RetryPolicy,
        transport::{Response, Transport},
    },
    foundation::{
        config::GrabConfig,
        core::TileCoord,
        error::{GrabError, GrabResult},
    },
};

/// Time label of incremental backups known to be corrupt.
pub const CORRUPT_TIME_LABEL: &str = "0000";

/// URL layout of the main site and the backup storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoints {
    pub api_url: String,
    pub storage_url: String,
}

impl Endpoints {
    pub fn new(api_url: impl Into<String>, storage_url: impl Into<String>) -> Self {
        let trim = |s: String| s.trim_end_matches('/').to_string();
        Self {
            api_url: trim(api_url.into()),
            storage_url: trim(storage_url.into()),
        }
    }

    pub fn from_config(cfg: &GrabConfig) -> Self {
        Self::new(cfg.api_url.clone(), cfg.storage_url.clone())
    }

    pub fn me(&self) -> String {
        format!("{}/api/me", self.api_url)
    }

    pub fn chunk(&self, canvas_id: &str, t: TileCoord) -> String {
        format!("{}/chunks/{canvas_id}/{}/{}.bmp", self.api_url, t.ix, t.iy)
    }

    fn day_dir(&self, date: NaiveDate, canvas_id: &str) -> String {
        format!(
            "{}/{:04}/{:02}/{:02}/{canvas_id}",
            self.storage_url,
            date.year(),
            date.month(),
            date.day()
        )
    }

    /// Tile of the full-day base snapshot.
    pub fn snapshot_tile(&self, date: NaiveDate, canvas_id: &str, t: TileCoord) -> String {
        format!("{}/tiles/{}/{}.png", self.day_dir(date, canvas_id), t.ix, t.iy)
    }

    /// Tile of one incremental time slice.
    pub fn incremental_tile(
        &self,
        date: NaiveDate,
        canvas_id: &str,
        time: &str,
        t: TileCoord,
    ) -> String {
        format!(
            "{}/{time}/{}/{}.png",
            self.day_dir(date, canvas_id),
            t.ix,
            t.iy
        )
    }

    pub fn time_list(&self, date: NaiveDate, canvas_id: &str) -> String {
        format!(
            "{}/history?day={}&id={canvas_id}",
            self.api_url,
            day_key(date)
        )
    }
}

/// Decoded raw chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkData {
    /// Empty body: the whole tile is background.
    Background,
    /// One palette-index byte per pixel, row-major.
    Indexed(Vec<u8>),
}

/// Result of one history tile request.
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayTile {
    Image(image::RgbaImage),
    /// The storage has no such tile (404).
    Missing,
}

/// Issues tile and metadata requests over one session, applying the retry policies.
#[derive(Clone, Copy)]
pub struct TileFetcher<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
    tile_retry: RetryPolicy,
    metadata_retry: RetryPolicy,
}

impl<'a> TileFetcher<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        endpoints: &'a Endpoints,
        tile_retry: RetryPolicy,
        metadata_retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            endpoints,
            tile_retry,
            metadata_retry,
        }
    }

    pub fn endpoints(&self) -> &'a Endpoints {
        self.endpoints
    }

    fn get_ok(&self, url: &str) -> GrabResult<Response> {
        let resp = self.transport.get(url)?;
        if !resp.is_success() {
            return Err(GrabError::fetch(format!("HTTP {} for {url}", resp.status)));
        }
        Ok(resp)
    }

    /// Canvas metadata from `/api/me`.
    pub fn fetch_me(&self) -> GrabResult<ApiMe> {
        let url = self.endpoints.me();
        self.metadata_retry.run(&url, || {
            let resp = self.get_ok(&url)?;
            serde_json::from_slice(&resp.body)
                .map_err(|e| GrabError::metadata(format!("decode {url}: {e}")))
        })
    }

    /// One raw snapshot chunk. Any non-success status is retried.
    pub fn fetch_chunk(&self, canvas_id: &str, t: TileCoord) -> GrabResult<ChunkData> {
        let url = self.endpoints.chunk(canvas_id, t);
        let data = self.tile_retry.run(&url, || {
            let resp = self.get_ok(&url)?;
            if resp.body.is_empty() {
                Ok(ChunkData::Background)
            } else {
                Ok(ChunkData::Indexed(resp.body))
            }
        })?;
        let pixels = match &data {
            ChunkData::Background => 0,
            ChunkData::Indexed(raw) => raw.len(),
        };
        tracing::debug!(url, pixels, "loaded chunk");
        Ok(data)
    }

    /// One history tile. 404 is a valid answer; other failures are retried, forever when
    /// `needed`.
    pub fn fetch_overlay(&self, url: &str, needed: bool) -> GrabResult<OverlayTile> {
        let policy = if needed {
            self.tile_retry.required()
        } else {
            self.tile_retry
        };
        policy.run(url, || {
            let resp = self.transport.get(url)?;
            if resp.is_not_found() {
                return Ok(OverlayTile::Missing);
            }
            if !resp.is_success() {
                return Err(GrabError::fetch(format!("HTTP {} for {url}", resp.status)));
            }
            let img = image::load_from_memory(&resp.body)
                .with_context(|| format!("decode tile image {url}"))
                .map_err(|e| GrabError::decode(format!("{e:#}")))?;
            Ok(OverlayTile::Image(img.to_rgba8()))
        })
    }

    /// Ordered time labels of one day's incremental backups.
    ///
    /// Retried until the body decodes; a 404 means the day has no incremental backups.
    pub fn fetch_time_list(&self, date: NaiveDate, canvas_id: &str) -> GrabResult<Vec<String>> {
        let url = self.endpoints.time_list(date, canvas_id);
        self.metadata_retry.required().run(&url, || {
            let resp = self.transport.get(&url)?;
            if resp.is_not_found() {
                tracing::warn!(url, "no incremental backups for this day");
                return Ok(Vec::new());
            }
            if !resp.is_success() {
                return Err(GrabError::fetch(format!("HTTP {} for {url}", resp.status)));
            }
            serde_json::from_slice(&resp.body).map_err(|e| {
                GrabError::metadata(format!("couldn't decode time list for {url}: {e}"))
            })
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fetch/fetcher.rs"]
mod tests;
