//! Loading screen: a centered progress bar drawn in clip space.

use asset::TriangleSoup;

pub const BAR_WIDTH_PX: f32 = 400.0;
pub const BAR_HEIGHT_PX: f32 = 30.0;

pub const BACKGROUND: [f32; 3] = [25.0 / 255.0, 25.0 / 255.0, 25.0 / 255.0];
pub const TRACK_COLOR: [f32; 3] = [50.0 / 255.0, 50.0 / 255.0, 50.0 / 255.0];
pub const FILL_COLOR: [f32; 3] = [100.0 / 255.0, 200.0 / 255.0, 1.0];

/// Vertices emitted by [`loading_bar_geometry`], independent of progress.
pub const LOADING_VERTEX_COUNT: usize = 12;

/// Track and fill quads for `fraction` in a `width`x`height` window.
/// The fill is empty (degenerate) at 0 and covers the track at 1.
pub fn loading_bar_geometry(width: u32, height: u32, fraction: f32) -> TriangleSoup {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    let x = (w - BAR_WIDTH_PX) / 2.0;
    let y = (h - BAR_HEIGHT_PX) / 2.0;
    let fill = BAR_WIDTH_PX * fraction.clamp(0.0, 1.0);

    let mut soup = TriangleSoup::with_capacity(4);
    push_rect(&mut soup, (w, h), [x, y, BAR_WIDTH_PX, BAR_HEIGHT_PX], TRACK_COLOR);
    push_rect(&mut soup, (w, h), [x, y, fill, BAR_HEIGHT_PX], FILL_COLOR);
    soup
}

/// `rect` is `[x, y, width, height]` in pixels, origin top-left.
fn push_rect(soup: &mut TriangleSoup, (w, h): (f32, f32), rect: [f32; 4], color: [f32; 3]) {
    let [x, y, rw, rh] = rect;
    let to_ndc = |px: f32, py: f32| [px / w * 2.0 - 1.0, 1.0 - py / h * 2.0, 0.0];
    let tl = to_ndc(x, y);
    let tr = to_ndc(x + rw, y);
    let bl = to_ndc(x, y + rh);
    let br = to_ndc(x + rw, y + rh);
    soup.push_triangle([tl, bl, br], color);
    soup.push_triangle([tl, br, tr], color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x_range(points: &[[f32; 3]]) -> (f32, f32) {
        points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
            (lo.min(p[0]), hi.max(p[0]))
        })
    }

    #[test]
    fn vertex_count_is_fixed() {
        for fraction in [0.0, 0.37, 1.0, 4.0] {
            let soup = loading_bar_geometry(1280, 720, fraction);
            assert_eq!(soup.vertex_count(), LOADING_VERTEX_COUNT);
            assert_eq!(soup.colors.len(), LOADING_VERTEX_COUNT);
        }
    }

    #[test]
    fn track_is_centered() {
        let soup = loading_bar_geometry(1280, 720, 0.0);
        let (lo, hi) = x_range(&soup.positions[..6]);
        assert!((lo + hi).abs() < 1e-6);
        assert!((hi - lo - 2.0 * 400.0 / 1280.0).abs() < 1e-6);
        assert!(soup.colors[..6].iter().all(|c| *c == TRACK_COLOR));
    }

    #[test]
    fn fill_grows_with_progress() {
        let empty = loading_bar_geometry(1280, 720, 0.0);
        let (lo, hi) = x_range(&empty.positions[6..]);
        assert_eq!(lo, hi);

        let half = loading_bar_geometry(1280, 720, 0.5);
        let (lo, hi) = x_range(&half.positions[6..]);
        assert!((hi - lo - 200.0 / 1280.0 * 2.0).abs() < 1e-6);

        let full = loading_bar_geometry(1280, 720, 1.0);
        assert_eq!(x_range(&full.positions[6..]), x_range(&full.positions[..6]));
        assert!(full.colors[6..].iter().all(|c| *c == FILL_COLOR));
    }
}
