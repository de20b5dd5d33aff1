use structures::{RasterError, RasterImage};

// Subsamples per pixel axis; coverage is hits / (N * N)
const SUBSAMPLES: u32 = 8;

/// Single-channel alpha surface in output pixel space.
pub(crate) struct Canvas {
    side: u32,
    alpha: Vec<f32>,
}

#[derive(Clone, Copy)]
struct Segment {
    a: (f32, f32),
    b: (f32, f32),
}

impl Segment {
    fn distance_squared(&self, p: (f32, f32)) -> f32 {
        let d = (self.b.0 - self.a.0, self.b.1 - self.a.1);
        let v = (p.0 - self.a.0, p.1 - self.a.1);
        let len_sq = d.0 * d.0 + d.1 * d.1;

        let t = if len_sq > 0.0 {
            ((v.0 * d.0 + v.1 * d.1) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let dx = v.0 - d.0 * t;
        let dy = v.1 - d.1 * t;
        dx * dx + dy * dy
    }

    /// Whether the segment's capsule of `radius` can reach the pixel at
    /// `(px, py)`.
    fn may_touch(&self, px: f32, py: f32, radius: f32) -> bool {
        self.a.0.min(self.b.0) - radius <= px + 1.0
            && self.a.0.max(self.b.0) + radius >= px
            && self.a.1.min(self.b.1) - radius <= py + 1.0
            && self.a.1.max(self.b.1) + radius >= py
    }
}

impl Canvas {
    pub(crate) fn new(side: u32) -> Self {
        Self {
            side,
            alpha: vec![0.0; side as usize * side as usize],
        }
    }

    /// Paints a polyline of `width` with round caps and joins, composited
    /// over what is already on the canvas with an opaque source.
    ///
    /// The painted region is the union of one capsule per segment, so
    /// overlapping segments of the same stroke do not darken each other. A
    /// single point paints a disc.
    pub(crate) fn stroke_polyline(&mut self, points: &[(f32, f32)], width: f32) {
        let Some(&first) = points.first() else {
            return;
        };

        let radius = width / 2.0;
        let radius_sq = radius * radius;

        let segments: Vec<Segment> = if points.len() == 1 {
            vec![Segment { a: first, b: first }]
        } else {
            points
                .windows(2)
                .map(|w| Segment { a: w[0], b: w[1] })
                .collect()
        };

        let (min_x, min_y, max_x, max_y) = points.iter().fold(
            (f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        );

        let last = self.side as i64 - 1;
        let x_range = pixel_span(min_x - radius, max_x + radius, last);
        let y_range = pixel_span(min_y - radius, max_y + radius, last);
        let (Some((x_start, x_end)), Some((y_start, y_end))) = (x_range, y_range) else {
            return;
        };

        let total = (SUBSAMPLES * SUBSAMPLES) as f32;
        let mut nearby: Vec<&Segment> = Vec::with_capacity(segments.len());

        for py in y_start..=y_end {
            for px in x_start..=x_end {
                let (fx, fy) = (px as f32, py as f32);

                nearby.clear();
                nearby.extend(segments.iter().filter(|s| s.may_touch(fx, fy, radius)));
                if nearby.is_empty() {
                    continue;
                }

                let mut hits = 0u32;
                for sy in 0..SUBSAMPLES {
                    for sx in 0..SUBSAMPLES {
                        let sample = (
                            fx + (sx as f32 + 0.5) / SUBSAMPLES as f32,
                            fy + (sy as f32 + 0.5) / SUBSAMPLES as f32,
                        );
                        if nearby
                            .iter()
                            .any(|s| s.distance_squared(sample) <= radius_sq)
                        {
                            hits += 1;
                        }
                    }
                }

                if hits > 0 {
                    let coverage = hits as f32 / total;
                    let dst = &mut self.alpha[py as usize * self.side as usize + px as usize];
                    *dst = coverage + *dst * (1.0 - coverage);
                }
            }
        }
    }

    pub(crate) fn into_raster(self) -> Result<RasterImage, RasterError> {
        let pixels = self
            .alpha
            .iter()
            .map(|&a| (a.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();

        RasterImage::from_pixels(self.side, pixels)
    }
}

/// Inclusive pixel index range touched by the device interval `[lo, hi]`,
/// clipped to `0..=last`.
fn pixel_span(lo: f32, hi: f32, last: i64) -> Option<(i64, i64)> {
    let start = (lo.floor() as i64).max(0);
    let end = (hi.floor() as i64).min(last);

    if start > end {
        None
    } else {
        Some((start, end))
    }
}
