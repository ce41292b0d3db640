//! Segment resolver — hierarchy listing plus pinned-version filter
//! compilation for persisted segments.

use std::sync::Arc;

use audience_catalog::CatalogRegistry;
use audience_compiler::{CompiledFilter, FilterCompiler};
use audience_core::fields::CatalogVersion;
use audience_core::segment::Segment;
use audience_core::AudienceResult;
use tracing::debug;

use crate::store::SegmentStore;

pub struct SegmentResolver {
    registry: Arc<CatalogRegistry>,
    compiler: Arc<FilterCompiler>,
    store: Arc<SegmentStore>,
}

impl SegmentResolver {
    pub fn new(
        registry: Arc<CatalogRegistry>,
        compiler: Arc<FilterCompiler>,
        store: Arc<SegmentStore>,
    ) -> Self {
        Self {
            registry,
            compiler,
            store,
        }
    }

    /// Segments in the given scope, creation order. See
    /// [`SegmentStore::list_segments`] for the parent semantics.
    pub fn list_segments(
        &self,
        audience_id: &str,
        parent_audience_id: Option<&str>,
    ) -> AudienceResult<Vec<Segment>> {
        self.store.list_segments(audience_id, parent_audience_id)
    }

    /// Compile a segment's stored filter under the catalog version pinned
    /// when the filter was last saved. Vocabulary upgrades never change the
    /// output for an existing segment.
    pub fn resolve_filter(&self, segment: &Segment) -> AudienceResult<CompiledFilter> {
        let compiled = self.compiler.compile(&segment.filter, segment.catalog_version)?;
        debug!(
            segment_id = %segment.id,
            catalog_version = %segment.catalog_version,
            params = compiled.params.len(),
            "resolved segment filter"
        );
        Ok(compiled)
    }

    /// True when the segment's filter references a field the latest catalog
    /// no longer carries. Derived on demand; the stored status is untouched.
    pub fn is_stale(&self, segment: &Segment) -> bool {
        segment
            .filter
            .field_keys()
            .iter()
            .any(|key| !self.registry.catalog(CatalogVersion::latest()).contains(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audience_core::filter::{ComparisonOperator, FilterNode};
    use audience_core::segment::{Audience, SegmentStatus};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn resolver() -> SegmentResolver {
        let registry = Arc::new(CatalogRegistry::bootstrap().unwrap());
        let compiler = Arc::new(FilterCompiler::new(registry.clone()));
        let store = Arc::new(SegmentStore::new(compiler.clone()));
        SegmentResolver::new(registry, compiler, store)
    }

    fn pinned_v0_segment(filter: FilterNode) -> Segment {
        let now = Utc::now();
        Segment {
            id: Uuid::new_v4(),
            audience_id: "aud_1".to_string(),
            parent_audience_id: None,
            name: "legacy".to_string(),
            filter,
            catalog_version: CatalogVersion::V0,
            status: SegmentStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_resolve_uses_pinned_version() {
        let resolver = resolver();
        let segment = pinned_v0_segment(FilterNode::leaf(
            "legacy_visitor_id",
            ComparisonOperator::Eq,
            json!("v-1"),
        ));
        // Compiles under v0 even though the latest catalog dropped the field.
        let compiled = resolver.resolve_filter(&segment).unwrap();
        assert_eq!(compiled.sql, "(\"legacy_visitor_id\" = ?)");
    }

    #[test]
    fn test_stale_detection_against_latest() {
        let resolver = resolver();
        let stale = pinned_v0_segment(FilterNode::leaf(
            "legacy_visitor_id",
            ComparisonOperator::Eq,
            json!("v-1"),
        ));
        assert!(resolver.is_stale(&stale));

        let fresh = pinned_v0_segment(FilterNode::leaf(
            "event_name",
            ComparisonOperator::Eq,
            json!("purchase"),
        ));
        assert!(!resolver.is_stale(&fresh));
    }

    #[test]
    fn test_listing_delegates_with_hierarchy_semantics() {
        let registry = Arc::new(CatalogRegistry::bootstrap().unwrap());
        let compiler = Arc::new(FilterCompiler::new(registry.clone()));
        let store = Arc::new(SegmentStore::new(compiler.clone()));
        let resolver = SegmentResolver::new(registry, compiler, store.clone());

        store.register_audience(Audience::new("aud_1", "Shoppers")).unwrap();
        store
            .create_segment(
                "aud_1",
                None,
                "top",
                FilterNode::leaf("event_name", ComparisonOperator::Eq, json!("view")),
            )
            .unwrap();

        assert_eq!(resolver.list_segments("aud_1", None).unwrap().len(), 1);
        assert!(resolver.list_segments("aud_1", Some("missing")).is_err());
    }
}
