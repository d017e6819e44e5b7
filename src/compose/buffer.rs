use crate::{
    canvas::palette::Palette,
    compose::blend::paste_masked_row,
    foundation::{
        core::{Region, Rgba8, TILE_PIXELS, TILE_SIZE, TRANSPARENT},
        error::{GrabError, GrabResult},
    },
};

/// Dense RGBA8 pixel store addressed in absolute canvas coordinates.
///
/// The bounding rectangle is fixed at creation. Writes that fall outside it are dropped, which
/// lets tiles that only partially overlap the requested region be placed without clipping at the
/// call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputBuffer {
    region: Region,
    data: Vec<u8>, // row-major straight-alpha rgba8
}

/// One tile's worth of pixels ready to be written, addressed by the tile's absolute top-left.
#[derive(Clone, Debug)]
pub enum Placement<'p> {
    /// Raw chunk bytes decoded through the palette.
    Indexed {
        origin: (i64, i64),
        raw: Vec<u8>,
        palette: &'p Palette,
    },
    /// Solid tile, e.g. the background for empty or missing tiles.
    Fill { origin: (i64, i64), color: Rgba8 },
    /// Decoded image pasted with its alpha as the mask.
    Paste {
        origin: (i64, i64),
        image: image::RgbaImage,
    },
}

/// Intersection of a rectangle with the buffer, in buffer-local pixels.
#[derive(Clone, Copy, Debug)]
struct Clip {
    // buffer-local
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    // offset of (x0, y0) inside the source rectangle
    sx: usize,
    sy: usize,
}

impl OutputBuffer {
    /// Fully transparent buffer.
    pub fn new(region: Region) -> Self {
        Self::filled(region, TRANSPARENT)
    }

    pub fn filled(region: Region, color: Rgba8) -> Self {
        let mut data = Vec::with_capacity(region.pixel_count() * 4);
        for _ in 0..region.pixel_count() {
            data.extend_from_slice(&color);
        }
        Self { region, data }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn width(&self) -> u32 {
        self.region.w
    }

    pub fn height(&self) -> u32 {
        self.region.h
    }

    fn offset_of(&self, x: i64, y: i64) -> Option<usize> {
        if !self.region.contains(x, y) {
            return None;
        }
        let lx = (x - self.region.x) as usize;
        let ly = (y - self.region.y) as usize;
        Some((ly * self.region.w as usize + lx) * 4)
    }

    /// Write one pixel; a no-op outside the bounding rectangle.
    pub fn set_pixel(&mut self, x: i64, y: i64, color: Rgba8) {
        if let Some(i) = self.offset_of(x, y) {
            self.data[i..i + 4].copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<Rgba8> {
        let i = self.offset_of(x, y)?;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    fn clip(&self, left: i64, top: i64, w: u32, h: u32) -> Option<Clip> {
        let x0 = left.max(self.region.x);
        let y0 = top.max(self.region.y);
        let x1 = (left + i64::from(w)).min(self.region.end_x());
        let y1 = (top + i64::from(h)).min(self.region.end_y());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Clip {
            x0: (x0 - self.region.x) as usize,
            y0: (y0 - self.region.y) as usize,
            x1: (x1 - self.region.x) as usize,
            y1: (y1 - self.region.y) as usize,
            sx: (x0 - left) as usize,
            sy: (y0 - top) as usize,
        })
    }

    fn row_span(&self, clip: &Clip, row: usize) -> std::ops::Range<usize> {
        let stride = self.region.w as usize * 4;
        let start = row * stride + clip.x0 * 4;
        start..start + (clip.x1 - clip.x0) * 4
    }

    /// Decode a raw chunk (one palette-index byte per pixel, 256 wide, row-major) whose top-left
    /// pixel sits at `origin`.
    ///
    /// Bytes past one full tile are ignored; a short payload only covers the rows it carries.
    pub fn place_indexed_tile(&mut self, origin: (i64, i64), raw: &[u8], palette: &Palette) {
        let Some(clip) = self.clip(origin.0, origin.1, TILE_SIZE, TILE_SIZE) else {
            return;
        };
        let raw = &raw[..raw.len().min(TILE_PIXELS)];
        let tile = TILE_SIZE as usize;
        for row in clip.y0..clip.y1 {
            let src_row = clip.sy + (row - clip.y0);
            let span = self.row_span(&clip, row);
            for (k, px) in self.data[span].chunks_exact_mut(4).enumerate() {
                let Some(&b) = raw.get(src_row * tile + clip.sx + k) else {
                    return;
                };
                px.copy_from_slice(&palette.resolve(b));
            }
        }
    }

    /// Fill the footprint of one tile with a solid color.
    pub fn fill_tile(&mut self, origin: (i64, i64), color: Rgba8) {
        self.fill_rect(origin, TILE_SIZE, TILE_SIZE, color);
    }

    pub fn fill_rect(&mut self, origin: (i64, i64), w: u32, h: u32, color: Rgba8) {
        let Some(clip) = self.clip(origin.0, origin.1, w, h) else {
            return;
        };
        for row in clip.y0..clip.y1 {
            let span = self.row_span(&clip, row);
            for px in self.data[span].chunks_exact_mut(4) {
                px.copy_from_slice(&color);
            }
        }
    }

    /// Paste a decoded tile image at `origin`, masked by its own alpha channel.
    pub fn paste_tile(&mut self, origin: (i64, i64), tile: &image::RgbaImage) {
        let (w, h) = tile.dimensions();
        let Some(clip) = self.clip(origin.0, origin.1, w, h) else {
            return;
        };
        let src = tile.as_raw();
        let src_stride = w as usize * 4;
        for row in clip.y0..clip.y1 {
            let src_row = clip.sy + (row - clip.y0);
            let start = src_row * src_stride + clip.sx * 4;
            let span = self.row_span(&clip, row);
            let len = span.len();
            paste_masked_row(&mut self.data[span], &src[start..start + len]);
        }
    }

    pub fn apply(&mut self, placement: &Placement<'_>) {
        match placement {
            Placement::Indexed {
                origin,
                raw,
                palette,
            } => self.place_indexed_tile(*origin, raw, palette),
            Placement::Fill { origin, color } => self.fill_tile(*origin, *color),
            Placement::Paste { origin, image } => self.paste_tile(*origin, image),
        }
    }

    /// Number of distinct colors, stopping once `limit` is exceeded.
    pub fn distinct_colors_up_to(&self, limit: usize) -> usize {
        let mut seen: Vec<&[u8]> = Vec::with_capacity(limit + 1);
        for px in self.data.chunks_exact(4) {
            if !seen.contains(&px) {
                seen.push(px);
                if seen.len() > limit {
                    break;
                }
            }
        }
        seen.len()
    }

    /// Whether every pixel holds the same color.
    pub fn is_uniform(&self) -> bool {
        self.distinct_colors_up_to(1) <= 1
    }

    /// Concrete image of exactly the bounding rectangle's size.
    pub fn materialize(&self) -> GrabResult<image::RgbaImage> {
        self.clone().into_image()
    }

    pub fn into_image(self) -> GrabResult<image::RgbaImage> {
        let (w, h) = (self.region.w, self.region.h);
        image::RgbaImage::from_raw(w, h, self.data)
            .ok_or_else(|| GrabError::decode(format!("output buffer does not match {w}x{h}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/buffer.rs"]
mod tests;
