//! The `labels.json` document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::{LabelError, Result};

/// Label schema plus one dense value array per group, indexed by `pos`.
///
/// `null` entries are unset scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelDocument {
    /// Name of the dimension the scenes were cut along
    #[serde(default)]
    pub case_dimension: String,

    /// Label group -> ordered permitted values
    pub schema: BTreeMap<String, Vec<String>>,

    /// Label group -> value per `pos`
    #[serde(default)]
    pub values: BTreeMap<String, Vec<Option<String>>>,

    /// Source dataset the labels are written back into, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netcdf_filename: Option<String>,
}

impl LabelDocument {
    /// A document with every scene unset.
    pub fn new(
        case_dimension: impl Into<String>,
        schema: BTreeMap<String, Vec<String>>,
        scene_count: usize,
    ) -> Self {
        let values = schema
            .keys()
            .map(|group| (group.clone(), vec![None; scene_count]))
            .collect();
        Self {
            case_dimension: case_dimension.into(),
            schema,
            values,
            netcdf_filename: None,
        }
    }

    pub fn from_json(json: &[u8]) -> Result<Self> {
        let doc: Self = serde_json::from_slice(json)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = Self::from_json(&std::fs::read(path)?)?;
        info!(path = %path.display(), groups = doc.schema.len(), "Loaded labels");
        Ok(doc)
    }

    /// Pretty-printed JSON, four-space indented.
    pub fn to_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        String::from_utf8(out).map_err(|e| LabelError::Parse(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), "Saved labels");
        Ok(())
    }

    /// Every value group must be in the schema and every set value must be
    /// permitted by it.
    pub fn validate(&self) -> Result<()> {
        for (group, values) in &self.values {
            let permitted = self
                .schema
                .get(group)
                .ok_or_else(|| LabelError::UnknownGroup(group.clone()))?;
            for value in values.iter().flatten() {
                if !permitted.contains(value) {
                    return Err(LabelError::InvalidValue {
                        group: group.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
