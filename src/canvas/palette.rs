use crate::foundation::{
    core::Rgba8,
    error::{GrabError, GrabResult},
};

/// Bit 7 of a raw chunk byte is a protection flag, not part of the color index.
pub const INDEX_MASK: u8 = 0x7F;

/// Ordered canvas color list, built once per run from canvas metadata.
///
/// Entry 0 is the canvas background. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgba8>,
}

impl Palette {
    pub fn from_rgb(colors: &[[u8; 3]]) -> GrabResult<Self> {
        if colors.is_empty() {
            return Err(GrabError::validation("palette must contain at least one color"));
        }
        Ok(Self {
            colors: colors.iter().map(|&[r, g, b]| [r, g, b, 255]).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn background(&self) -> Rgba8 {
        self.colors[0]
    }

    /// Map a raw chunk byte to its color. Out-of-range indices resolve to the background.
    pub fn resolve(&self, raw: u8) -> Rgba8 {
        let idx = usize::from(raw & INDEX_MASK);
        self.colors.get(idx).copied().unwrap_or_else(|| self.background())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/palette.rs"]
mod tests;
