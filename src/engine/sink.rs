use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::GrabResult;

/// Consumer of finished frames, numbered from 1 in emission order.
pub trait FrameSink {
    fn write_frame(&mut self, seq: u64, frame: &image::RgbaImage) -> GrabResult<()>;
}

/// Keeps every frame in memory.
impl FrameSink for Vec<image::RgbaImage> {
    fn write_frame(&mut self, _seq: u64, frame: &image::RgbaImage) -> GrabResult<()> {
        self.push(frame.clone());
        Ok(())
    }
}

/// Writes `t{seq}.png` files into one directory, ready for `ffmpeg -i t%d.png`.
#[derive(Clone, Debug)]
pub struct PngDirSink {
    dir: PathBuf,
}

impl PngDirSink {
    /// Create `dir` if needed.
    pub fn create(dir: impl Into<PathBuf>) -> GrabResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, seq: u64) -> PathBuf {
        self.dir.join(format!("t{seq}.png"))
    }
}

impl FrameSink for PngDirSink {
    fn write_frame(&mut self, seq: u64, frame: &image::RgbaImage) -> GrabResult<()> {
        let path = self.path_for(seq);
        save_png(&path, frame)?;
        tracing::debug!(path = %path.display(), "wrote frame");
        Ok(())
    }
}

/// Save an image as PNG, creating parent directories.
pub fn save_png(path: &Path, img: &image::RgbaImage) -> GrabResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        path,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/engine/sink.rs"]
mod tests;
