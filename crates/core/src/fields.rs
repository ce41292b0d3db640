//! Queryable field vocabulary — versioned, typed descriptors for every
//! attribute a filter author can reference.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A published catalog snapshot. Old versions stay live so that filters
/// compiled against them keep resolving.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CatalogVersion {
    /// Deprecated original vocabulary, retained for stored filters.
    V0,
    /// Current vocabulary.
    V1,
}

impl CatalogVersion {
    pub fn latest() -> Self {
        CatalogVersion::V1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogVersion::V0 => "v0",
            CatalogVersion::V1 => "v1",
        }
    }

    pub fn is_deprecated(&self) -> bool {
        *self != Self::latest()
    }
}

impl fmt::Display for CatalogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage type of a catalog field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Json,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Json => "json",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic bucket a field belongs to. Partitions the vocabulary by source
/// table; consumers filter on it, so wire names are a compatibility contract.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    /// Raw pixel events and their payload columns.
    PixelEvent,
    /// Resolved identity attributes.
    Resolution,
}

impl FieldGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::PixelEvent => "pixel_event",
            FieldGroup::Resolution => "resolution",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FieldGroup::PixelEvent => "Pixel Events",
            FieldGroup::Resolution => "Identity Resolution",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the field catalog.
///
/// `key` is a dotted path, unique within a catalog version. A `nested` field
/// addresses a leaf inside a JSON container column; its first key segment
/// names the container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FieldDescriptor {
    pub key: String,
    pub group: FieldGroup,
    pub field_type: FieldType,
    pub nested: bool,
}

impl FieldDescriptor {
    /// A plain column field.
    pub fn column(key: impl Into<String>, group: FieldGroup, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            group,
            field_type,
            nested: false,
        }
    }

    /// A leaf inside a JSON container column.
    pub fn nested(key: impl Into<String>, group: FieldGroup, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            group,
            field_type,
            nested: true,
        }
    }

    /// First dotted segment of the key — the storage column.
    pub fn container(&self) -> &str {
        self.key.split('.').next().unwrap_or(&self.key)
    }

    /// Key segments beyond the container. Empty for plain columns.
    pub fn path_segments(&self) -> Vec<&str> {
        self.key.split('.').skip(1).collect()
    }
}
