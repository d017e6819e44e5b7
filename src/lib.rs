//! pixelgrab reconstructs rectangular regions of a tiled pixel canvas, either as they are now
//! or replayed day by day from the backup storage.
//!
//! # Pipeline overview
//!
//! 1. **Map**: `Region + canvas size -> TileGrid` (which 256x256 tiles cover the region)
//! 2. **Fetch**: every tile of a batch is requested concurrently on a bounded worker pool,
//!    retried per [`RetryPolicy`]
//! 3. **Compose**: raw chunks are decoded through the [`Palette`], history tiles are pasted with
//!    their alpha mask, all into an [`OutputBuffer`] addressed in absolute canvas coordinates
//! 4. **Emit**: the buffer is materialized into an `image::RgbaImage` (area mode) or handed to a
//!    [`FrameSink`] frame by frame (history mode)
//!
//! Network access goes through the [`Transport`] / [`Connect`] traits so the engine can be driven
//! by any HTTP client; [`HttpConnector`] is the `reqwest` implementation.
#![forbid(unsafe_code)]

mod canvas;
mod compose;
mod engine;
mod fetch;
mod foundation;
mod grid;

pub use canvas::meta::{ApiMe, CanvasMeta, HistoricalSize, day_key};
pub use canvas::palette::{INDEX_MASK, Palette};
pub use canvas::region::parse_corners;
pub use compose::blend::{paste_masked, paste_masked_row};
pub use compose::buffer::{OutputBuffer, Placement};
pub use engine::area::download_area;
pub use engine::history::{DayRange, HistorySequencer, HistoryStats, download_history};
pub use engine::pool::{build_thread_pool, run_batch};
pub use engine::sink::{FrameSink, PngDirSink, save_png};
pub use fetch::fetcher::{CORRUPT_TIME_LABEL, ChunkData, Endpoints, OverlayTile, TileFetcher};
pub use fetch::retry::RetryPolicy;
pub use fetch::transport::{Connect, HttpConnector, HttpTransport, Response, Transport};
pub use foundation::config::{DEFAULT_API_URL, DEFAULT_STORAGE_URL, GrabConfig};
pub use foundation::core::{Region, Rgba8, TILE_PIXELS, TILE_SIZE, TRANSPARENT, TileCoord};
pub use foundation::error::{GrabError, GrabResult};
pub use grid::mapper::{TileGrid, canvas_offset};
