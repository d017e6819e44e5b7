use crate::foundation::{
    core::Region,
    error::{GrabError, GrabResult},
};

/// Parse inclusive `x_y` corner strings into a [`Region`] on a canvas of edge `size`.
///
/// Fractional coordinates are floored. Both corners must lie in `[-size/2, size/2)` and the
/// bottom-right corner must not be above or left of the top-left one.
pub fn parse_corners(top_left: &str, bottom_right: &str, size: u32) -> GrabResult<Region> {
    let (x, y) = parse_corner(top_left, "top-left")?;
    let (u, v) = parse_corner(bottom_right, "bottom-right")?;

    if u < x || v < y {
        return Err(GrabError::validation("corner coordinates are aligned wrong"));
    }

    let max = i64::from(size / 2);
    let min = -max;
    let inside = |c: i64| (min..max).contains(&c);
    if !inside(x) || !inside(y) {
        return Err(GrabError::validation(
            "coordinates of top-left corner are outside of canvas",
        ));
    }
    if !inside(u) || !inside(v) {
        return Err(GrabError::validation(
            "coordinates of bottom-right corner are outside of canvas",
        ));
    }

    let w = u32::try_from(u - x + 1)
        .map_err(|_| GrabError::validation("region width does not fit in u32"))?;
    let h = u32::try_from(v - y + 1)
        .map_err(|_| GrabError::validation("region height does not fit in u32"))?;
    Region::new(x, y, w, h)
}

fn parse_corner(raw: &str, which: &str) -> GrabResult<(i64, i64)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(GrabError::validation("not all coordinates defined"));
    }
    let mut parts = raw.split('_');
    let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GrabError::validation(format!(
            "invalid coordinate format for {which} corner (expected X_Y)"
        )));
    };
    Ok((parse_axis(a, "x", which)?, parse_axis(b, "y", which)?))
}

fn parse_axis(raw: &str, axis: &str, which: &str) -> GrabResult<i64> {
    let v: f64 = raw.trim().parse().map_err(|_| {
        GrabError::validation(format!("{axis} of {which} corner is not a valid number"))
    })?;
    if !v.is_finite() {
        return Err(GrabError::validation(format!(
            "{axis} of {which} corner is not a valid number"
        )));
    }
    Ok(v.floor() as i64)
}

#[cfg(test)]
#[path = "../../tests/unit/canvas/region.rs"]
mod tests;
