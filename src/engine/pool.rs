use std::sync::Mutex;

use rayon::prelude::*;

use crate::{
    compose::buffer::{OutputBuffer, Placement},
    foundation::{
        core::TileCoord,
        error::{GrabError, GrabResult},
    },
};

/// Worker pool for tile batches; its size bounds the number of in-flight requests.
pub fn build_thread_pool(threads: Option<usize>) -> GrabResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(GrabError::validation(
            "tile fetch 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("pixelgrab-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| GrabError::fetch(format!("failed to build rayon thread pool: {e}")))
}

/// Fetch every tile on the pool and place the results into `buffer`.
///
/// Returns once all tiles are placed. Fetching happens outside the lock; each placement holds
/// it only while writing. The first error aborts the batch.
pub fn run_batch<'p, F>(
    pool: &rayon::ThreadPool,
    tiles: &[TileCoord],
    buffer: &Mutex<OutputBuffer>,
    fetch: F,
) -> GrabResult<()>
where
    F: Fn(TileCoord) -> GrabResult<Option<Placement<'p>>> + Sync,
{
    pool.install(|| {
        tiles.par_iter().try_for_each(|&t| {
            let Some(placement) = fetch(t)? else {
                return Ok(());
            };
            let mut guard = buffer
                .lock()
                .map_err(|_| GrabError::fetch("output buffer lock poisoned"))?;
            guard.apply(&placement);
            Ok(())
        })
    })
}

#[cfg(test)]
#[path = "../../tests/unit/engine/pool.rs"]
mod tests;
