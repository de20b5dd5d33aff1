use crate::errors::StrokeError;

/// Side of the implicit square canvas every stroke coordinate lives on.
pub const CANVAS_SIDE: f32 = 256.0;

/// One continuous pen path, stored as parallel coordinate arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stroke {
    x: Vec<u8>,
    y: Vec<u8>,
}

impl Stroke {
    pub fn new(x: Vec<u8>, y: Vec<u8>) -> Result<Self, StrokeError> {
        if x.len() != y.len() {
            return Err(StrokeError::MismatchedAxes {
                x: x.len(),
                y: y.len(),
            });
        }

        Ok(Self { x, y })
    }

    pub fn from_points(points: &[(u8, u8)]) -> Self {
        Self {
            x: points.iter().map(|p| p.0).collect(),
            y: points.iter().map(|p| p.1).collect(),
        }
    }

    pub fn x(&self) -> &[u8] {
        &self.x
    }

    pub fn y(&self) -> &[u8] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Per-axis maximum coordinate, `None` for an empty stroke.
    pub fn max(&self) -> Option<(u8, u8)> {
        Some((*self.x.iter().max()?, *self.y.iter().max()?))
    }
}

/// One decoded sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: u64,
    pub country_code: [u8; 2],
    pub recognized: bool,
    pub timestamp: u32,
    /// Paint order; later strokes are composited over earlier ones.
    pub strokes: Vec<Stroke>,
}

impl Drawing {
    pub fn country_code(&self) -> String {
        String::from_utf8_lossy(&self.country_code).into_owned()
    }

    pub fn num_points(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }

    /// Per-axis maximum over every point of every stroke.
    pub fn bbox_max(&self) -> Option<(u8, u8)> {
        bbox_max(&self.strokes)
    }
}

/// Per-axis maximum over every point in `strokes`, or `None` when there
/// are no points.
pub fn bbox_max(strokes: &[Stroke]) -> Option<(u8, u8)> {
    strokes
        .iter()
        .filter_map(Stroke::max)
        .reduce(|a, b| (a.0.max(b.0), a.1.max(b.1)))
}
