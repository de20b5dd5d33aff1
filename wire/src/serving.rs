//! Turning a client request into the sentence the client displays.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, warn};
use structures::{LabelTable, ModelManifest, RasterImage, UNKNOWN_CATEGORY};

use crate::{codec::decode_payload, errors::ServeError};

/// Body the drawing client posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "binaryData")]
    pub binary_data: String,
}

/// Body the drawing client reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(rename = "Response")]
    pub response: String,
}

impl PredictionResponse {
    pub fn unknown() -> Self {
        Self {
            response: UNKNOWN_CATEGORY.to_string(),
        }
    }
}

/// A trained model: one score per class index.
pub trait Classifier {
    type Error: fmt::Display;

    fn predict(&self, image: &RasterImage) -> Result<Vec<f32>, Self::Error>;
}

/// How a category name is put into a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phrasing {
    /// Names that take "the" and a capital letter.
    pub proper_nouns: BTreeSet<String>,
    /// Names that take no article.
    pub plurals: BTreeSet<String>,
}

impl Default for Phrasing {
    fn default() -> Self {
        Self {
            proper_nouns: ["moon", "sun"].into_iter().map(String::from).collect(),
            plurals: ["pants", "peas", "scissors", "stairs"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Phrasing {
    pub fn sentence(&self, name: &str) -> String {
        if self.plurals.contains(name) {
            return format!("I think you are drawing {name}");
        }

        if self.proper_nouns.contains(name) {
            let mut chars = name.chars();
            let capitalized: String = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
            return format!("I think you are drawing the {capitalized}");
        }

        let article = match name.chars().next() {
            Some(c) if "aeiou".contains(c.to_ascii_lowercase()) => "an",
            _ => "a",
        };
        format!("I think you are drawing {article} {name}")
    }

    /// Sentence for a class index, or `"Unknown"` when the table has no such
    /// class.
    pub fn describe(&self, labels: &LabelTable, index: i64) -> String {
        match labels.name_of(index) {
            Some(name) => self.sentence(name),
            None => UNKNOWN_CATEGORY.to_string(),
        }
    }
}

/// Index of the highest score. NaN scores are ignored; ties go to the lowest
/// index.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .fold(None, |best: Option<(usize, f32)>, (i, &score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((i, score)),
        })
        .map(|(i, _)| i)
}

/// Serves predictions for one model.
pub struct Predictor<C> {
    manifest: ModelManifest,
    classifier: C,
    phrasing: Phrasing,
}

impl<C: Classifier> Predictor<C> {
    /// Fails unless the model was trained on grids the wire can deliver.
    pub fn new(manifest: ModelManifest, classifier: C, phrasing: Phrasing) -> Result<Self, ServeError> {
        if !manifest.encoding.is_wire_compatible() {
            return Err(ServeError::EncodingMismatch(manifest.encoding));
        }

        Ok(Self {
            manifest,
            classifier,
            phrasing,
        })
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// A malformed payload is an error. Anything that goes wrong after the
    /// grid is decoded answers `"Unknown"`.
    pub fn handle(&self, request: &PredictionRequest) -> Result<PredictionResponse, ServeError> {
        let grid = decode_payload(&request.binary_data)?;
        let image = grid.to_raster();

        let scores = match self.classifier.predict(&image) {
            Ok(scores) => scores,
            Err(err) => {
                warn!("classifier failed: {}", err);
                return Ok(PredictionResponse::unknown());
            }
        };

        let Some(index) = argmax(&scores) else {
            warn!("classifier returned no usable scores");
            return Ok(PredictionResponse::unknown());
        };
        debug!("predicted class {} of {}", index, scores.len());

        let index = i64::try_from(index).unwrap_or(i64::MAX);
        if self.manifest.labels.name_of(index).is_none() {
            warn!(
                "predicted class {} outside the {} known categories",
                index,
                self.manifest.labels.len()
            );
        }

        Ok(PredictionResponse {
            response: self.phrasing.describe(&self.manifest.labels, index),
        })
    }

    /// [`Predictor::handle`] on a raw JSON body.
    pub fn handle_json(&self, body: &str) -> Result<String, ServeError> {
        let request: PredictionRequest = serde_json::from_str(body)?;
        let response = self.handle(&request)?;
        Ok(serde_json::to_string(&response)?)
    }
}
