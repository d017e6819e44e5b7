use crate::foundation::core::{Region, TILE_SIZE, TileCoord};

/// Offset between canvas-absolute coordinates and tile-grid pixel coordinates.
///
/// Canvases are centered at the origin, so grid pixel 0 sits at `floor(-size/2)`.
pub fn canvas_offset(size: u32) -> i64 {
    (-i64::from(size)).div_euclid(2)
}

/// Inclusive range of tiles covering a region on a canvas of a given edge length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub offset: i64,
    pub min: TileCoord,
    pub max: TileCoord, // inclusive
}

impl TileGrid {
    /// Minimal tile range whose footprints cover `region`.
    pub fn covering(region: Region, canvas_size: u32) -> Self {
        let offset = canvas_offset(canvas_size);
        let tile = i64::from(TILE_SIZE);
        let index = |abs: i64| (abs - offset).div_euclid(tile);
        Self {
            offset,
            min: TileCoord::new(index(region.x), index(region.y)),
            max: TileCoord::new(index(region.end_x() - 1), index(region.end_y() - 1)),
        }
    }

    pub fn columns(&self) -> u64 {
        (self.max.ix - self.min.ix + 1) as u64
    }

    pub fn rows(&self) -> u64 {
        (self.max.iy - self.min.iy + 1) as u64
    }

    pub fn tile_count(&self) -> u64 {
        self.columns() * self.rows()
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> Vec<TileCoord> {
        let mut out = Vec::with_capacity(self.tile_count().min(1 << 20) as usize);
        for iy in self.min.iy..=self.max.iy {
            for ix in self.min.ix..=self.max.ix {
                out.push(TileCoord::new(ix, iy));
            }
        }
        out
    }

    /// Absolute coordinate of a tile's top-left pixel.
    pub fn tile_origin(&self, tile: TileCoord) -> (i64, i64) {
        let t = i64::from(TILE_SIZE);
        (tile.ix * t + self.offset, tile.iy * t + self.offset)
    }

    /// Absolute coordinate of pixel `(px, py)` inside `tile`.
    pub fn pixel_abs(&self, tile: TileCoord, px: u32, py: u32) -> (i64, i64) {
        let (ox, oy) = self.tile_origin(tile);
        (ox + i64::from(px), oy + i64::from(py))
    }

    /// Tile origin relative to the top-left corner of `region`.
    pub fn tile_origin_local(&self, tile: TileCoord, region: Region) -> (i64, i64) {
        let (ox, oy) = self.tile_origin(tile);
        (ox - region.x, oy - region.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/mapper.rs"]
mod tests;
