use std::{collections::HashMap, io::Cursor, sync::Mutex};

use super::*;

/// Serves queued responses per URL; the last one repeats once the queue is drained.
#[derive(Default)]
struct Scripted {
    routes: Mutex<HashMap<String, Vec<GrabResult<Response>>>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl Scripted {
    fn on(self, url: &str, responses: Vec<GrabResult<Response>>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), responses);
        self
    }

    fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

impl Transport for Scripted {
    fn get(&self, url: &str) -> GrabResult<Response> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(url) else {
            return Ok(Response::new(404, Vec::new()));
        };
        let next = if queue.len() > 1 {
            queue.remove(0)
        } else {
            match &queue[0] {
                Ok(r) => Ok(r.clone()),
                Err(e) => Err(GrabError::fetch(e.to_string())),
            }
        };
        next
    }
}

fn instant() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 4,
        delay_ms: 0,
        required: false,
    }
}

fn endpoints() -> Endpoints {
    Endpoints::new("http://api.test/", "http://store.test")
}

fn png_bytes(color: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba(color));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, 9).unwrap()
}

#[test]
fn endpoint_layout() {
    let e = endpoints();
    let t = TileCoord::new(3, 4);
    assert_eq!(e.me(), "http://api.test/api/me");
    assert_eq!(e.chunk("0", t), "http://api.test/chunks/0/3/4.bmp");
    assert_eq!(
        e.snapshot_tile(date(), "0", t),
        "http://store.test/2021/03/09/0/tiles/3/4.png"
    );
    assert_eq!(
        e.incremental_tile(date(), "0", "1230", t),
        "http://store.test/2021/03/09/0/1230/3/4.png"
    );
    assert_eq!(
        e.time_list(date(), "0"),
        "http://api.test/history?day=20210309&id=0"
    );
}

#[test]
fn empty_chunk_is_background() {
    let e = endpoints();
    let url = e.chunk("0", TileCoord::new(1, 1));
    let t = Scripted::default().on(&url, vec![Ok(Response::new(200, Vec::new()))]);
    let f = TileFetcher::new(&t, &e, instant(), instant());
    assert_eq!(
        f.fetch_chunk("0", TileCoord::new(1, 1)).unwrap(),
        ChunkData::Background
    );
}

#[test]
fn chunk_retries_transient_failures() {
    let e = endpoints();
    let url = e.chunk("0", TileCoord::new(0, 0));
    let t = Scripted::default().on(
        &url,
        vec![
            Err(GrabError::fetch("connection reset")),
            Ok(Response::new(502, Vec::new())),
            Ok(Response::new(200, vec![1, 2, 3])),
        ],
    );
    let f = TileFetcher::new(&t, &e, instant(), instant());
    assert_eq!(
        f.fetch_chunk("0", TileCoord::new(0, 0)).unwrap(),
        ChunkData::Indexed(vec![1, 2, 3])
    );
    assert_eq!(t.hits(&url), 3);
}

#[test]
fn chunk_gives_up_after_four_attempts() {
    let e = endpoints();
    let url = e.chunk("0", TileCoord::new(0, 0));
    let t = Scripted::default().on(&url, vec![Ok(Response::new(500, Vec::new()))]);
    let f = TileFetcher::new(&t, &e, instant(), instant());
    let err = f.fetch_chunk("0", TileCoord::new(0, 0)).unwrap_err();
    assert!(matches!(err, GrabError::Exhausted { attempts: 4, .. }));
    assert_eq!(t.hits(&url), 4);
}

#[test]
fn overlay_404_is_missing_without_retry() {
    let e = endpoints();
    let url = e.snapshot_tile(date(), "0", TileCoord::new(0, 0));
    let t = Scripted::default();
    let f = TileFetcher::new(&t, &e, instant(), instant());
    assert_eq!(f.fetch_overlay(&url, true).unwrap(), OverlayTile::Missing);
    assert_eq!(t.hits(&url), 1);
}

#[test]
fn overlay_decodes_png() {
    let e = endpoints();
    let url = e.incremental_tile(date(), "0", "1200", TileCoord::new(0, 0));
    let t = Scripted::default().on(&url, vec![Ok(Response::new(200, png_bytes([1, 2, 3, 255])))]);
    let f = TileFetcher::new(&t, &e, instant(), instant());
    let OverlayTile::Image(img) = f.fetch_overlay(&url, false).unwrap() else {
        panic!("expected an image");
    };
    assert_eq!(img.dimensions(), (2, 2));
    assert_eq!(img.get_pixel(1, 1).0, [1, 2, 3, 255]);
}

#[test]
fn needed_overlay_outlasts_the_retry_budget() {
    let e = endpoints();
    let url = e.snapshot_tile(date(), "0", TileCoord::new(0, 0));
    let mut script: Vec<GrabResult<Response>> =
        (0..9).map(|_| Ok(Response::new(503, Vec::new()))).collect();
    script.push(Ok(Response::new(200, png_bytes([0, 0, 0, 255]))));
    let t = Scripted::default().on(&url, script);
    let f = TileFetcher::new(&t, &e, instant(), instant());
    assert!(matches!(
        f.fetch_overlay(&url, true).unwrap(),
        OverlayTile::Image(_)
    ));
    assert_eq!(t.hits(&url), 10);
}

#[test]
fn optional_overlay_gives_up() {
    let e = endpoints();
    let url = e.incremental_tile(date(), "0", "1200", TileCoord::new(0, 0));
    let t = Scripted::default().on(&url, vec![Ok(Response::new(200, b"not a png".to_vec()))]);
    let f = TileFetcher::new(&t, &e, instant(), instant());
    assert!(matches!(
        f.fetch_overlay(&url, false),
        Err(GrabError::Exhausted { .. })
    ));
}

#[test]
fn time_list_retries_until_it_decodes() {
    let e = endpoints();
    let url = e.time_list(date(), "0");
    let t = Scripted::default().on(
        &url,
        vec![
            Ok(Response::new(200, b"<html>".to_vec())),
            Ok(Response::new(200, b"[\"0000\",".to_vec())),
            Ok(Response::new(200, b"[\"0000\",\"1200\"]".to_vec())),
        ],
    );
    let f = TileFetcher::new(&t, &e, instant(), instant());
    assert_eq!(f.fetch_time_list(date(), "0").unwrap(), vec!["0000", "1200"]);
    assert_eq!(t.hits(&url), 3);
}

#[test]
fn time_list_404_is_empty() {
    let e = endpoints();
    let t = Scripted::default();
    let f = TileFetcher::new(&t, &e, instant(), instant());
    assert!(f.fetch_time_list(date(), "0").unwrap().is_empty());
}

#[test]
fn fetch_me_decodes_canvases() {
    let e = endpoints();
    let body = br#"{"canvases":{"0":{"size":512,"colors":[[255,255,255],[0,0,0]],"title":"t"}}}"#;
    let t = Scripted::default().on(&e.me(), vec![Ok(Response::new(200, body.to_vec()))]);
    let f = TileFetcher::new(&t, &e, instant(), instant());
    let me = f.fetch_me().unwrap();
    assert_eq!(me.canvas("0").unwrap().size, 512);
}
