use log::debug;
use rayon::prelude::*;
use structures::{bbox_max, Drawing, RasterEncoding, RasterImage, Stroke, CANVAS_SIDE};

use crate::{canvas::Canvas, errors::RenderError, params::RenderParams};

/// Shift that centers a drawing on the canvas, computed from the per-axis
/// maximum of its points.
///
/// Quickdraw drawings are normalized so their minimum sits at 0, which makes
/// the maximum the drawing's extent. A drawing filling the whole canvas gets
/// an offset of `(0.5, 0.5)`.
pub fn centering_offset(strokes: &[Stroke]) -> Option<(f32, f32)> {
    let (max_x, max_y) = bbox_max(strokes)?;

    Some((
        (CANVAS_SIDE - f32::from(max_x)) / 2.0,
        (CANVAS_SIDE - f32::from(max_y)) / 2.0,
    ))
}

/// Renders strokes into a `side x side` grid of ink coverage.
///
/// Every stroke must have at least one point. Later strokes paint over
/// earlier ones.
pub fn vector_to_raster(
    strokes: &[Stroke],
    params: &RenderParams,
) -> Result<RasterImage, RenderError> {
    params.validate()?;

    if strokes.is_empty() {
        return Err(RenderError::NoStrokes);
    }
    if let Some(index) = strokes.iter().position(Stroke::is_empty) {
        return Err(RenderError::EmptyStroke { index });
    }

    let (offset_x, offset_y) = centering_offset(strokes).ok_or(RenderError::NoStrokes)?;
    let transform = params.transform();
    let line_width = transform.to_device_length(params.line_diameter);

    let mut canvas = Canvas::new(params.side);
    let mut points = Vec::new();

    for stroke in strokes {
        points.clear();
        points.extend(stroke.points().map(|(x, y)| {
            transform.to_device(f32::from(x) + offset_x, f32::from(y) + offset_y)
        }));

        canvas.stroke_polyline(&points, line_width);
    }

    Ok(canvas.into_raster()?)
}

/// Renders a drawing under `encoding`, including its ink convention.
pub fn render_drawing(
    drawing: &Drawing,
    encoding: &RasterEncoding,
) -> Result<RasterImage, RenderError> {
    let image = vector_to_raster(&drawing.strokes, &RenderParams::from(encoding))?;
    Ok(encoding.apply_ink(image))
}

/// Renders drawings in parallel. Results are in input order.
pub fn render_batch(
    drawings: &[Drawing],
    encoding: &RasterEncoding,
) -> Vec<Result<RasterImage, RenderError>> {
    debug!(
        "rendering {} drawings at side {}",
        drawings.len(),
        encoding.side
    );

    drawings
        .par_iter()
        .map(|drawing| render_drawing(drawing, encoding))
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn x_strokes() -> Vec<Stroke> {
        vec![
            Stroke::from_points(&[(0, 0), (255, 255)]),
            Stroke::from_points(&[(255, 0), (0, 255)]),
        ]
    }

    fn ink_centroid(image: &RasterImage) -> (f32, f32) {
        let mut total = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for y in 0..image.side() {
            for x in 0..image.side() {
                let w = f32::from(image.pixel(x, y));
                total += w;
                cx += w * (x as f32 + 0.5);
                cy += w * (y as f32 + 0.5);
            }
        }
        (cx / total, cy / total)
    }

    #[test]
    fn x_renders_centered_at_28() {
        let image = vector_to_raster(&x_strokes(), &RenderParams::new(28, 16.0, 16.0)).unwrap();

        assert_eq!(image.side(), 28);
        assert_eq!(image.pixels().len(), 28 * 28);

        for (x, y) in [(0, 0), (27, 0), (0, 27), (27, 27)] {
            assert!(image.pixel(x, y) < 10, "corner ({x}, {y}) is inked");
        }
        for (x, y) in [(13, 13), (14, 14), (13, 14), (14, 13)] {
            assert!(image.pixel(x, y) > 240, "center ({x}, {y}) is not inked");
        }

        // both diagonals, nothing on the middle of the edges
        assert!(image.pixel(5, 5) > 200);
        assert!(image.pixel(22, 5) > 200);
        assert_eq!(image.pixel(13, 0), 0);
        assert_eq!(image.pixel(0, 13), 0);

        // antialiased edges exist
        assert!(image.pixels().iter().any(|&p| p > 0 && p < 255));
    }

    #[test]
    fn full_extent_barely_moves() {
        assert_eq!(centering_offset(&x_strokes()), Some((0.5, 0.5)));
    }

    #[test]
    fn offset_uses_the_maximum_across_strokes() {
        // each axis maximum comes from a different stroke
        let strokes = vec![
            Stroke::from_points(&[(0, 0), (200, 40)]),
            Stroke::from_points(&[(10, 100)]),
        ];
        assert_eq!(bbox_max(&strokes), Some((200, 100)));
        assert_eq!(centering_offset(&strokes), Some((28.0, 78.0)));

        assert_eq!(centering_offset(&[]), None);
        assert_eq!(
            centering_offset(&[Stroke::new(Vec::new(), Vec::new()).unwrap()]),
            None
        );
    }

    #[test]
    fn quadrant_drawing_is_recentered() {
        let strokes = vec![Stroke::from_points(&[(0, 0), (127, 127)])];
        assert_eq!(centering_offset(&strokes), Some((64.5, 64.5)));

        let image = vector_to_raster(&strokes, &RenderParams::new(28, 16.0, 16.0)).unwrap();
        let (cx, cy) = ink_centroid(&image);
        assert!((cx - 14.0).abs() < 0.5, "centroid x {cx}");
        assert!((cy - 14.0).abs() < 0.5, "centroid y {cy}");

        // the top left corner region stays empty once centered
        assert_eq!(image.pixel(3, 3), 0);
    }

    #[test]
    fn axes_are_not_swapped() {
        // a horizontal bar along the top, anchored to the full canvas
        let strokes = vec![
            Stroke::from_points(&[(0, 20), (255, 20)]),
            Stroke::from_points(&[(255, 255)]),
        ];
        let image = vector_to_raster(&strokes, &RenderParams::new(64, 8.0, 16.0)).unwrap();

        // (20.5 + 20) * 64 / 296 ~= 8.8
        assert!(image.pixel(32, 8) > 200);
        assert_eq!(image.pixel(8, 32), 0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        let strokes: Vec<Stroke> = (0..5)
            .map(|_| {
                let points: Vec<(u8, u8)> = (0..rng.gen_range(1..20))
                    .map(|_| (rng.gen(), rng.gen()))
                    .collect();
                Stroke::from_points(&points)
            })
            .collect();

        for params in [
            RenderParams::new(28, 16.0, 16.0),
            RenderParams::new(64, 8.0, 16.0),
        ] {
            let a = vector_to_raster(&strokes, &params).unwrap();
            let b = vector_to_raster(&strokes, &params).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn degenerate_input_is_rejected() {
        let params = RenderParams::new(28, 16.0, 16.0);

        assert_eq!(vector_to_raster(&[], &params), Err(RenderError::NoStrokes));
        assert_eq!(
            vector_to_raster(
                &[
                    Stroke::from_points(&[(1, 1)]),
                    Stroke::from_points(&[]),
                ],
                &params
            ),
            Err(RenderError::EmptyStroke { index: 1 })
        );
    }

    #[test]
    fn binary_encoding_has_only_two_levels() {
        let drawing = Drawing {
            id: 1,
            country_code: *b"GB",
            recognized: true,
            timestamp: 0,
            strokes: x_strokes(),
        };

        let image = render_drawing(&drawing, &RasterEncoding::WIRE_64).unwrap();
        assert_eq!(image.side(), 64);
        assert!(image.pixels().iter().all(|&p| p == 0 || p == 255));
        assert!(image.ink_pixels() > 0);
    }

    #[test]
    fn batch_keeps_input_order() {
        let drawings: Vec<Drawing> = [x_strokes(), vec![], vec![Stroke::from_points(&[(9, 9)])]]
            .into_iter()
            .enumerate()
            .map(|(i, strokes)| Drawing {
                id: i as u64,
                country_code: *b"FR",
                recognized: true,
                timestamp: 0,
                strokes,
            })
            .collect();

        let results = render_batch(&drawings, &RasterEncoding::QUICKDRAW_28);
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap(),
            &render_drawing(&drawings[0], &RasterEncoding::QUICKDRAW_28).unwrap()
        );
        assert_eq!(results[1], Err(RenderError::NoStrokes));
        assert!(results[2].is_ok());
    }
}
