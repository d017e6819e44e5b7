use super::*;

fn frame(color: [u8; 4]) -> image::RgbaImage {
    image::RgbaImage::from_pixel(3, 2, image::Rgba(color))
}

#[test]
fn vec_sink_collects_in_order() {
    let mut sink: Vec<image::RgbaImage> = Vec::new();
    sink.write_frame(1, &frame([1, 0, 0, 255])).unwrap();
    sink.write_frame(2, &frame([2, 0, 0, 255])).unwrap();
    assert_eq!(sink.len(), 2);
    assert_eq!(sink[1].get_pixel(0, 0).0, [2, 0, 0, 255]);
}

#[test]
fn png_dir_sink_numbers_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("timelapse");
    let mut sink = PngDirSink::create(&out).unwrap();
    sink.write_frame(1, &frame([9, 8, 7, 255])).unwrap();
    sink.write_frame(2, &frame([0, 0, 0, 0])).unwrap();

    assert_eq!(sink.path_for(2), out.join("t2.png"));
    let back = image::open(out.join("t1.png")).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (3, 2));
    assert_eq!(back.get_pixel(2, 1).0, [9, 8, 7, 255]);
    assert!(out.join("t2.png").is_file());
}

#[test]
fn save_png_creates_parents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("area.png");
    save_png(&path, &frame([5, 5, 5, 255])).unwrap();
    assert!(path.is_file());
}
