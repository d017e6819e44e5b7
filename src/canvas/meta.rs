use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    canvas::palette::Palette,
    foundation::error::{GrabError, GrabResult},
};

/// Subset of the `/api/me` response that describes the available canvases.
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
pub struct ApiMe {
    #[serde(default)]
    pub canvases: BTreeMap<String, CanvasMeta>,
}

impl ApiMe {
    /// Look up a canvas by id.
    pub fn canvas(&self, id: &str) -> GrabResult<&CanvasMeta> {
        self.canvases
            .get(id)
            .ok_or_else(|| GrabError::validation(format!("invalid canvas selected: '{id}'")))
    }

    /// `(id, title)` of every canvas that can be downloaded (3D canvases excluded).
    pub fn flat_canvases(&self) -> Vec<(&str, &str)> {
        self.canvases
            .iter()
            .filter(|(_, c)| !c.is_3d)
            .map(|(id, c)| (id.as_str(), c.title.as_str()))
            .collect()
    }
}

/// Immutable per-run description of one canvas.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct CanvasMeta {
    /// Current edge length; valid coordinates run over `[-size/2, size/2)`.
    pub size: u32,
    /// Ordered palette; entry 0 is the background.
    pub colors: Vec<[u8; 3]>,
    /// `(YYYYMMDD, size)` pairs giving past edge lengths.
    #[serde(default, rename = "historicalSizes")]
    pub historical_sizes: Vec<HistoricalSize>,
    #[serde(default, rename = "v")]
    pub is_3d: bool,
    #[serde(default)]
    pub title: String,
}

/// Edge length in effect up to and including `date`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "(DateKey, u32)")]
pub struct HistoricalSize {
    pub date: String,
    pub size: u32,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum DateKey {
    Text(String),
    Num(u64),
}

impl From<(DateKey, u32)> for HistoricalSize {
    fn from((date, size): (DateKey, u32)) -> Self {
        let date = match date {
            DateKey::Text(s) => s,
            DateKey::Num(n) => n.to_string(),
        };
        Self { date, size }
    }
}

impl CanvasMeta {
    pub fn palette(&self) -> GrabResult<Palette> {
        Palette::from_rgb(&self.colors)
    }

    pub fn ensure_2d(&self) -> GrabResult<()> {
        if self.is_3d {
            return Err(GrabError::validation("can't get area for 3D canvas"));
        }
        Ok(())
    }

    /// Edge length the canvas had on `date`.
    ///
    /// The first historical entry dated on or after `date` wins; without one the current size
    /// applies.
    pub fn size_on(&self, date: NaiveDate) -> u32 {
        let key = day_key(date);
        self.historical_sizes
            .iter()
            .find(|h| key.as_str() <= h.date.as_str())
            .map_or(self.size, |h| h.size)
    }
}

/// `YYYYMMDD` form used by the backup storage and the history endpoint.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/meta.rs"]
mod tests;
