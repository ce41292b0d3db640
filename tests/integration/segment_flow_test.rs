//! Integration test for the full catalog -> compile -> resolve flow.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use audience_catalog::CatalogRegistry;
    use audience_compiler::FilterCompiler;
    use audience_core::fields::CatalogVersion;
    use audience_core::filter::{ComparisonOperator, FilterNode};
    use audience_core::segment::{Audience, SegmentStatus};
    use audience_core::sync::{RefreshInterval, SyncConfig};
    use audience_segments::{SegmentResolver, SegmentStore};
    use serde_json::json;

    fn wire() -> (Arc<SegmentStore>, SegmentResolver) {
        let registry = Arc::new(CatalogRegistry::bootstrap().unwrap());
        let compiler = Arc::new(FilterCompiler::new(registry.clone()));
        let store = Arc::new(SegmentStore::new(compiler.clone()));
        let resolver = SegmentResolver::new(registry, compiler, store.clone());
        (store, resolver)
    }

    /// Sample checkout filter referencing both a plain column and a JSON
    /// leaf of the pixel-event payload.
    fn checkout_filter() -> FilterNode {
        FilterNode::and(vec![
            FilterNode::leaf("event_name", ComparisonOperator::Eq, json!("purchase")),
            FilterNode::leaf(
                "event_data.purchase_amount",
                ComparisonOperator::Gt,
                json!(100),
            ),
        ])
    }

    #[test]
    fn test_create_list_and_resolve() {
        let (store, resolver) = wire();
        store
            .register_audience(Audience::new("aud_1", "All shoppers"))
            .unwrap();
        store
            .register_audience(Audience::nested("aud_1_vip", "VIP shoppers", "aud_1"))
            .unwrap();

        let top_a = store
            .create_segment("aud_1", None, "Purchasers", checkout_filter())
            .unwrap();
        let top_b = store
            .create_segment(
                "aud_1",
                None,
                "Identified",
                FilterNode::leaf("email", ComparisonOperator::IsSet, serde_json::Value::Null),
            )
            .unwrap();
        let nested = store
            .create_segment(
                "aud_1",
                Some("aud_1_vip".to_string()),
                "Big spenders",
                FilterNode::leaf("lifetime_value", ComparisonOperator::Gte, json!(1000)),
            )
            .unwrap();

        // Top-level listing excludes the nested segment, creation order.
        let top = resolver.list_segments("aud_1", None).unwrap();
        assert_eq!(
            top.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![top_a.id, top_b.id]
        );

        let children = resolver.list_segments("aud_1", Some("aud_1_vip")).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, nested.id);

        // Pinned to the latest catalog at creation time.
        assert_eq!(top_a.catalog_version, CatalogVersion::latest());

        let compiled = resolver.resolve_filter(&top_a).unwrap();
        assert_eq!(
            compiled.sql,
            "((\"event_name\" = ?) AND (\"event_data\"->>? > ?))"
        );
        assert_eq!(compiled.placeholder_count(), compiled.params.len());
        assert_eq!(
            compiled.params,
            vec![json!("purchase"), json!("purchase_amount"), json!(100)]
        );
    }

    #[test]
    fn test_lifecycle_and_sync_gated_removal() {
        let (store, resolver) = wire();
        store
            .register_audience(Audience::new("aud_1", "All shoppers"))
            .unwrap();
        let segment = store
            .create_segment("aud_1", None, "Purchasers", checkout_filter())
            .unwrap();

        // Recompute cycle
        store.transition(segment.id, SegmentStatus::Active).unwrap();
        store
            .transition(segment.id, SegmentStatus::Refreshing)
            .unwrap();
        store.transition(segment.id, SegmentStatus::Active).unwrap();

        // A registered sync turns removal into archival.
        store
            .register_sync(SyncConfig::new(
                segment.id,
                "ad-acct-9",
                "platform-aud-77",
                RefreshInterval::Weekly,
            ))
            .unwrap();
        let (removed, archived) = store.remove_segment(segment.id).unwrap();
        assert!(archived);
        assert_eq!(removed.status, SegmentStatus::Archived);

        // Archived segments drop out of listings but stay resolvable.
        assert!(resolver.list_segments("aud_1", None).unwrap().is_empty());
        let still_there = store.get_segment(segment.id).unwrap();
        assert!(resolver.resolve_filter(&still_there).is_ok());
    }
}
