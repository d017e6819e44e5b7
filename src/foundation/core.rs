use crate::foundation::error::{GrabError, GrabResult};

/// Edge length of one remote tile, in pixels.
pub const TILE_SIZE: u32 = 256;

/// Number of pixels in one tile.
pub const TILE_PIXELS: usize = (TILE_SIZE as usize) * (TILE_SIZE as usize);

/// Straight-alpha RGBA8 color.
pub type Rgba8 = [u8; 4];

/// Fully transparent pixel, the value of never-written output.
pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

/// Index of one tile in the remote tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileCoord {
    pub ix: i64,
    pub iy: i64,
}

impl TileCoord {
    pub fn new(ix: i64, iy: i64) -> Self {
        Self { ix, iy }
    }
}

/// Absolute canvas rectangle requested by the caller.
///
/// `x`/`y` may be negative since canvases are centered at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Region {
    pub x: i64,
    pub y: i64,
    pub w: u32, // must be > 0
    pub h: u32, // must be > 0
}

impl Region {
    pub fn new(x: i64, y: i64, w: u32, h: u32) -> GrabResult<Self> {
        if w == 0 || h == 0 {
            return Err(GrabError::validation("Region width and height must be > 0"));
        }
        Ok(Self { x, y, w, h })
    }

    /// First column past the right edge.
    pub fn end_x(self) -> i64 {
        self.x + i64::from(self.w)
    }

    /// First row past the bottom edge.
    pub fn end_y(self) -> i64 {
        self.y + i64::from(self.h)
    }

    pub fn contains(self, x: i64, y: i64) -> bool {
        self.x <= x && x < self.end_x() && self.y <= y && y < self.end_y()
    }

    pub fn pixel_count(self) -> usize {
        (self.w as usize) * (self.h as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
