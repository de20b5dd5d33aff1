use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use rmp_serde::{Deserializer, Serializer};
use serde::{Deserialize, Serialize};

use crate::encoding::RasterEncoding;
use crate::errors::ManifestError;
use crate::labels::LabelTable;

/// Everything serving needs to know about how a model was trained: the
/// raster encoding of its inputs and the class index of each category.
///
/// Stored as MessagePack next to the model weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub encoding: RasterEncoding,
    pub labels: LabelTable,
}

impl ModelManifest {
    pub fn new(encoding: RasterEncoding, labels: LabelTable) -> Self {
        Self { encoding, labels }
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), ManifestError> {
        let mut serializer = Serializer::new(writer).with_struct_map();
        self.serialize(&mut serializer)?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ManifestError> {
        let mut deserializer = Deserializer::new(reader);
        let manifest: ModelManifest = Deserialize::deserialize(&mut deserializer)?;
        manifest.encoding.validate()?;
        Ok(manifest)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }
}
