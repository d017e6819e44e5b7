#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::Cursor,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use pixelgrab::{
    CanvasMeta, Connect, GrabConfig, GrabError, GrabResult, Response, RetryPolicy, Transport,
};

pub const API: &str = "http://api.test";
pub const STORE: &str = "http://store.test";

#[derive(Clone, Debug)]
pub enum Reply {
    Status(u16, Vec<u8>),
    Fail(&'static str),
}

/// In-memory stand-in for the canvas site and its backup storage.
///
/// Each URL has a queue of replies; the last reply repeats once the queue is drained. Unknown
/// URLs answer 404.
#[derive(Default)]
pub struct FakeRemote {
    routes: Mutex<HashMap<String, Vec<Reply>>>,
    hits: Mutex<HashMap<String, usize>>,
    connects: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: impl Into<String>, status: u16, body: Vec<u8>) {
        self.script(url, vec![Reply::Status(status, body)]);
    }

    pub fn script(&self, url: impl Into<String>, replies: Vec<Reply>) {
        assert!(!replies.is_empty());
        self.routes.lock().unwrap().insert(url.into(), replies);
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn answer(&self, url: &str) -> GrabResult<Response> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url) {
                None => Reply::Status(404, Vec::new()),
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) => queue[0].clone(),
            }
        };
        match reply {
            Reply::Status(status, body) => Ok(Response::new(status, body)),
            Reply::Fail(msg) => Err(GrabError::fetch(msg)),
        }
    }
}

pub struct FakeSession(Arc<FakeRemote>);

impl Transport for FakeSession {
    fn get(&self, url: &str) -> GrabResult<Response> {
        self.0.answer(url)
    }
}

#[derive(Clone)]
pub struct FakeConnector(pub Arc<FakeRemote>);

impl Connect for FakeConnector {
    fn connect(&self) -> GrabResult<Box<dyn Transport>> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession(self.0.clone())))
    }
}

/// Config pointing at the fake remote, without retry delays.
pub fn test_config() -> GrabConfig {
    let instant = RetryPolicy {
        delay_ms: 0,
        ..RetryPolicy::tiles()
    };
    GrabConfig {
        api_url: API.to_string(),
        storage_url: STORE.to_string(),
        threads: Some(4),
        tile_retry: instant,
        metadata_retry: instant,
        ..GrabConfig::default()
    }
}

pub fn canvas(size: u32, colors: &[[u8; 3]]) -> CanvasMeta {
    let json = serde_json::json!({ "size": size, "colors": colors, "title": "test" });
    serde_json::from_value(json).unwrap()
}

/// 256x256 PNG filled with `fill`, with single-pixel overrides.
pub fn tile_png(fill: [u8; 4], dots: &[((u32, u32), [u8; 4])]) -> Vec<u8> {
    let mut img = image::RgbaImage::from_pixel(256, 256, image::Rgba(fill));
    for &((x, y), c) in dots {
        img.put_pixel(x, y, image::Rgba(c));
    }
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}
