use std::sync::Mutex;

use crate::{
    canvas::meta::CanvasMeta,
    compose::buffer::{OutputBuffer, Placement},
    engine::pool::{build_thread_pool, run_batch},
    fetch::{
        fetcher::{ChunkData, Endpoints, TileFetcher},
        transport::Connect,
    },
    foundation::{
        config::GrabConfig,
        core::Region,
        error::{GrabError, GrabResult},
    },
    grid::mapper::TileGrid,
};

/// Download the current state of `region` into one image.
///
/// Every covering chunk is fetched in a single batch over one session. A chunk that exhausts its
/// retry budget aborts the run. Pixels no chunk wrote stay transparent.
#[tracing::instrument(skip(connector, cfg, canvas), fields(canvas_size = canvas.size))]
pub fn download_area(
    connector: &dyn Connect,
    cfg: &GrabConfig,
    canvas_id: &str,
    canvas: &CanvasMeta,
    region: Region,
) -> GrabResult<image::RgbaImage> {
    cfg.validate()?;
    canvas.ensure_2d()?;
    let palette = canvas.palette()?;
    let grid = TileGrid::covering(region, canvas.size);
    tracing::info!(
        from = ?(grid.min.ix, grid.min.iy),
        to = ?(grid.max.ix, grid.max.iy),
        tiles = grid.tile_count(),
        "loading area"
    );

    let pool = build_thread_pool(cfg.threads)?;
    let endpoints = Endpoints::from_config(cfg);
    let session = connector.connect()?;
    let fetcher = TileFetcher::new(
        session.as_ref(),
        &endpoints,
        cfg.tile_retry,
        cfg.metadata_retry,
    );

    let buffer = Mutex::new(OutputBuffer::new(region));
    run_batch(&pool, &grid.tiles(), &buffer, |t| {
        let origin = grid.tile_origin(t);
        let placement = match fetcher.fetch_chunk(canvas_id, t)? {
            ChunkData::Background => Placement::Fill {
                origin,
                color: palette.background(),
            },
            ChunkData::Indexed(raw) => Placement::Indexed {
                origin,
                raw,
                palette: &palette,
            },
        };
        Ok(Some(placement))
    })?;

    let buffer = buffer
        .into_inner()
        .map_err(|_| GrabError::fetch("output buffer lock poisoned"))?;
    buffer.into_image()
}
