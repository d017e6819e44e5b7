use crate::foundation::core::Rgba8;

/// Paste `src` onto `dst` using the source alpha as the mask.
///
/// Every channel, alpha included, is interpolated between `dst` and `src` by the mask, so an
/// opaque source replaces the destination and a transparent one leaves it untouched.
pub fn paste_masked(dst: Rgba8, src: Rgba8) -> Rgba8 {
    let m = u16::from(src[3]);
    if m == 0 {
        return dst;
    }
    if m == 255 {
        return src;
    }

    let inv = 255u16 - m;
    let mut out = [0u8; 4];
    for i in 0..4 {
        let sc = mul_div255(u16::from(src[i]), m);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Whole-slice [`paste_masked`] over equal-length RGBA8 rows.
pub fn paste_masked_row(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = paste_masked([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
