//! Catalog registry — immutable, versioned snapshots of the field
//! vocabulary, built once at startup (load, freeze, serve).

use std::collections::HashMap;

use audience_core::fields::{CatalogVersion, FieldDescriptor, FieldGroup, FieldType};
use audience_core::{AudienceError, AudienceResult};
use dashmap::DashMap;
use tracing::info;

use crate::mapper::{to_expression, ExpressionEntry};

/// One published catalog version: an ordered, validated field sequence.
#[derive(Debug)]
pub struct FieldCatalog {
    version: CatalogVersion,
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl FieldCatalog {
    /// Validate and freeze a field sequence.
    ///
    /// Rejects duplicate keys, `json`-typed fields with dotted keys (a json
    /// key must denote the container, leaves are resolved at compile time),
    /// and nested fields whose container is not cataloged as `json`.
    pub fn new(version: CatalogVersion, fields: Vec<FieldDescriptor>) -> AudienceResult<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.key.clone(), i).is_some() {
                return Err(AudienceError::Validation(format!(
                    "duplicate field key '{}' in catalog {}",
                    field.key, version
                )));
            }
            if field.field_type == FieldType::Json && field.key.contains('.') {
                return Err(AudienceError::Validation(format!(
                    "json field '{}' must denote its container, not a leaf",
                    field.key
                )));
            }
        }
        for field in &fields {
            if field.nested {
                let container_ok = index
                    .get(field.container())
                    .map(|&i| fields[i].field_type == FieldType::Json)
                    .unwrap_or(false);
                if !container_ok {
                    return Err(AudienceError::Validation(format!(
                        "nested field '{}' has no json container '{}' in catalog {}",
                        field.key,
                        field.container(),
                        version
                    )));
                }
            }
        }
        Ok(Self {
            version,
            fields,
            index,
        })
    }

    pub fn version(&self) -> CatalogVersion {
        self.version
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn lookup(&self, key: &str) -> AudienceResult<&FieldDescriptor> {
        self.index
            .get(key)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| AudienceError::UnknownField {
                key: key.to_string(),
                version: self.version,
            })
    }
}

/// Process-wide registry of all live catalog versions plus the derived
/// expression cache. Immutable after `bootstrap`; shared via `Arc`.
pub struct CatalogRegistry {
    v0: FieldCatalog,
    v1: FieldCatalog,
    expressions: DashMap<(CatalogVersion, String), ExpressionEntry>,
}

impl CatalogRegistry {
    /// Build both built-in versions and freeze the registry.
    pub fn bootstrap() -> AudienceResult<Self> {
        let v0 = catalog_v0()?;
        let v1 = catalog_v1()?;
        info!(
            v0_fields = v0.fields().len(),
            v1_fields = v1.fields().len(),
            latest = %CatalogVersion::latest(),
            "field catalog registry frozen"
        );
        Ok(Self {
            v0,
            v1,
            expressions: DashMap::new(),
        })
    }

    pub fn catalog(&self, version: CatalogVersion) -> &FieldCatalog {
        match version {
            CatalogVersion::V0 => &self.v0,
            CatalogVersion::V1 => &self.v1,
        }
    }

    pub fn latest(&self) -> &FieldCatalog {
        self.catalog(CatalogVersion::latest())
    }

    pub fn fields(&self, version: CatalogVersion) -> &[FieldDescriptor] {
        self.catalog(version).fields()
    }

    pub fn lookup(&self, key: &str, version: CatalogVersion) -> AudienceResult<&FieldDescriptor> {
        self.catalog(version).lookup(key)
    }

    /// Expression for a field key, memoized per `(version, key)`. Entries
    /// are derived from immutable descriptors and never invalidated
    /// in-process.
    pub fn expression(
        &self,
        version: CatalogVersion,
        key: &str,
    ) -> AudienceResult<ExpressionEntry> {
        if let Some(hit) = self.expressions.get(&(version, key.to_string())) {
            return Ok(hit.clone());
        }
        let descriptor = self.lookup(key, version)?;
        let entry = to_expression(descriptor);
        self.expressions
            .insert((version, key.to_string()), entry.clone());
        Ok(entry)
    }
}

/// Original vocabulary. Deprecated; retained so filters saved against it
/// keep resolving. `legacy_visitor_id` was dropped in v1.
fn catalog_v0() -> AudienceResult<FieldCatalog> {
    use FieldGroup::{PixelEvent, Resolution};
    use FieldType::{Date, Json, Number, String as Str};

    FieldCatalog::new(
        CatalogVersion::V0,
        vec![
            FieldDescriptor::column("event_name", PixelEvent, Str),
            FieldDescriptor::column("page_url", PixelEvent, Str),
            FieldDescriptor::column("occurred_at", PixelEvent, Date),
            FieldDescriptor::column("event_data", PixelEvent, Json),
            FieldDescriptor::nested("event_data.purchase_amount", PixelEvent, Number),
            FieldDescriptor::column("email", Resolution, Str),
            FieldDescriptor::column("legacy_visitor_id", Resolution, Str),
            FieldDescriptor::column("household_income", Resolution, Number),
            FieldDescriptor::column("enrichment", Resolution, Json),
            FieldDescriptor::nested("enrichment.age_range", Resolution, Str),
        ],
    )
}

/// Current vocabulary: v0 minus `legacy_visitor_id`, plus campaign
/// attribution and resolved-value fields.
fn catalog_v1() -> AudienceResult<FieldCatalog> {
    use FieldGroup::{PixelEvent, Resolution};
    use FieldType::{Boolean, Date, Json, Number, String as Str};

    FieldCatalog::new(
        CatalogVersion::V1,
        vec![
            FieldDescriptor::column("event_name", PixelEvent, Str),
            FieldDescriptor::column("page_url", PixelEvent, Str),
            FieldDescriptor::column("occurred_at", PixelEvent, Date),
            FieldDescriptor::column("utm_source", PixelEvent, Str),
            FieldDescriptor::column("event_data", PixelEvent, Json),
            FieldDescriptor::nested("event_data.purchase_amount", PixelEvent, Number),
            FieldDescriptor::nested("event_data.currency", PixelEvent, Str),
            FieldDescriptor::nested("event_data.order_id", PixelEvent, Str),
            FieldDescriptor::column("email", Resolution, Str),
            FieldDescriptor::column("household_income", Resolution, Number),
            FieldDescriptor::column("lifetime_value", Resolution, Number),
            FieldDescriptor::column("opted_out", Resolution, Boolean),
            FieldDescriptor::column("enrichment", Resolution, Json),
            FieldDescriptor::nested("enrichment.age_range", Resolution, Str),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_builds_both_versions() {
        let registry = CatalogRegistry::bootstrap().unwrap();
        assert_eq!(registry.catalog(CatalogVersion::V0).version(), CatalogVersion::V0);
        assert_eq!(registry.latest().version(), CatalogVersion::V1);
        assert!(registry.fields(CatalogVersion::V1).len() > registry.fields(CatalogVersion::V0).len());
    }

    #[test]
    fn test_keys_unique_per_version() {
        let registry = CatalogRegistry::bootstrap().unwrap();
        for version in [CatalogVersion::V0, CatalogVersion::V1] {
            let fields = registry.fields(version);
            let mut keys: Vec<_> = fields.iter().map(|f| f.key.as_str()).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), fields.len());
        }
    }

    #[test]
    fn test_lookup_unknown_field_names_key_and_version() {
        let registry = CatalogRegistry::bootstrap().unwrap();
        let err = registry
            .lookup("lifetime_value", CatalogVersion::V0)
            .unwrap_err();
        match err {
            AudienceError::UnknownField { key, version } => {
                assert_eq!(key, "lifetime_value");
                assert_eq!(version, CatalogVersion::V0);
            }
            other => panic!("expected UnknownField, got {other:?}"),
        }
        // Same key resolves in the current version.
        assert!(registry.lookup("lifetime_value", CatalogVersion::V1).is_ok());
    }

    #[test]
    fn test_deprecated_field_still_resolves_in_v0() {
        let registry = CatalogRegistry::bootstrap().unwrap();
        assert!(registry.lookup("legacy_visitor_id", CatalogVersion::V0).is_ok());
        assert!(registry.lookup("legacy_visitor_id", CatalogVersion::V1).is_err());
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = FieldCatalog::new(
            CatalogVersion::V1,
            vec![
                FieldDescriptor::column("email", FieldGroup::Resolution, FieldType::String),
                FieldDescriptor::column("email", FieldGroup::Resolution, FieldType::String),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, AudienceError::Validation(_)));
    }

    #[test]
    fn test_rejects_dotted_json_container() {
        let err = FieldCatalog::new(
            CatalogVersion::V1,
            vec![FieldDescriptor::column(
                "event_data.nested",
                FieldGroup::PixelEvent,
                FieldType::Json,
            )],
        )
        .unwrap_err();
        assert!(matches!(err, AudienceError::Validation(_)));
    }

    #[test]
    fn test_rejects_nested_field_without_json_container() {
        let err = FieldCatalog::new(
            CatalogVersion::V1,
            vec![FieldDescriptor::nested(
                "event_data.purchase_amount",
                FieldGroup::PixelEvent,
                FieldType::Number,
            )],
        )
        .unwrap_err();
        assert!(matches!(err, AudienceError::Validation(_)));
    }

    #[test]
    fn test_expression_cache_is_pure() {
        let registry = CatalogRegistry::bootstrap().unwrap();
        let first = registry
            .expression(CatalogVersion::V1, "event_data.purchase_amount")
            .unwrap();
        let second = registry
            .expression(CatalogVersion::V1, "event_data.purchase_amount")
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_group_and_type_partitions_stable_across_versions() {
        // Consumers filtering on group == pixel_event / type == json must see
        // consistent partitions in every version.
        let registry = CatalogRegistry::bootstrap().unwrap();
        for version in [CatalogVersion::V0, CatalogVersion::V1] {
            let json_fields: Vec<_> = registry
                .fields(version)
                .iter()
                .filter(|f| f.field_type == FieldType::Json)
                .map(|f| f.key.as_str())
                .collect();
            assert_eq!(json_fields, vec!["event_data", "enrichment"]);
        }
    }
}
