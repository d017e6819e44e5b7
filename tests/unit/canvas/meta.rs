use super::*;

const ME_JSON: &str = r#"
{
  "name": null,
  "canvases": {
    "0": {
      "ident": "d",
      "title": "Earth",
      "size": 65536,
      "colors": [[202, 227, 255], [255, 255, 255], [0, 0, 0]],
      "historicalSizes": [["20200101", 256], [20210101, 1024]]
    },
    "2": {
      "title": "3D Canvas",
      "size": 1024,
      "colors": [[255, 255, 255]],
      "v": true
    }
  }
}
"#;

fn me() -> ApiMe {
    serde_json::from_str(ME_JSON).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn parses_canvas_metadata() {
    let me = me();
    let earth = me.canvas("0").unwrap();
    assert_eq!(earth.size, 65536);
    assert_eq!(earth.title, "Earth");
    assert!(!earth.is_3d);
    assert_eq!(earth.historical_sizes.len(), 2);
    assert_eq!(earth.historical_sizes[1].date, "20210101");
    assert_eq!(earth.palette().unwrap().background(), [202, 227, 255, 255]);
    assert!(me.canvas("9").is_err());
}

#[test]
fn flat_canvases_skip_3d() {
    let me = me();
    assert_eq!(me.flat_canvases(), vec![("0", "Earth")]);
    assert!(me.canvas("2").unwrap().ensure_2d().is_err());
    assert!(me.canvas("0").unwrap().ensure_2d().is_ok());
}

#[test]
fn size_on_picks_first_entry_not_before_date() {
    let me = me();
    let earth = me.canvas("0").unwrap();
    assert_eq!(earth.size_on(day(2019, 6, 1)), 256);
    assert_eq!(earth.size_on(day(2020, 1, 1)), 256);
    assert_eq!(earth.size_on(day(2020, 1, 2)), 1024);
    assert_eq!(earth.size_on(day(2021, 1, 1)), 1024);
    assert_eq!(earth.size_on(day(2021, 1, 2)), 65536);
}

#[test]
fn day_key_is_compact() {
    assert_eq!(day_key(day(2022, 3, 7)), "20220307");
}
