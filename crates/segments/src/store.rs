//! In-process segment store — dashmap-backed registries for audiences,
//! segments, and sync references, with catalog re-validation on every
//! filter write.

use std::collections::HashSet;
use std::sync::Arc;

use audience_compiler::FilterCompiler;
use audience_core::fields::CatalogVersion;
use audience_core::filter::FilterNode;
use audience_core::segment::{Audience, Segment, SegmentStatus};
use audience_core::sync::SyncConfig;
use audience_core::{AudienceError, AudienceResult};
use chrono::Utc;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

pub struct SegmentStore {
    audiences: DashMap<String, Audience>,
    segments: DashMap<Uuid, Segment>,
    syncs: DashMap<Uuid, SyncConfig>,
    compiler: Arc<FilterCompiler>,
}

impl SegmentStore {
    pub fn new(compiler: Arc<FilterCompiler>) -> Self {
        Self {
            audiences: DashMap::new(),
            segments: DashMap::new(),
            syncs: DashMap::new(),
            compiler,
        }
    }

    /// Register (or replace) an audience. The parent, when given, must
    /// already exist and the parent chain must terminate.
    pub fn register_audience(&self, audience: Audience) -> AudienceResult<()> {
        if let Some(parent) = &audience.parent_audience_id {
            if !self.audiences.contains_key(parent) {
                return Err(AudienceError::not_found("audience", parent.clone()));
            }
            self.check_parent_chain(&audience.id, parent)?;
        }
        info!(audience_id = %audience.id, name = %audience.name, "registered audience");
        self.audiences.insert(audience.id.clone(), audience);
        Ok(())
    }

    fn check_parent_chain(&self, new_id: &str, parent: &str) -> AudienceResult<()> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor = parent.to_string();
        loop {
            if cursor == new_id || !seen.insert(cursor.clone()) {
                return Err(AudienceError::Validation(format!(
                    "audience parentage cycle through '{}'",
                    cursor
                )));
            }
            match self
                .audiences
                .get(&cursor)
                .and_then(|a| a.parent_audience_id.clone())
            {
                Some(next) => cursor = next,
                None => return Ok(()),
            }
        }
    }

    pub fn get_audience(&self, id: &str) -> AudienceResult<Audience> {
        self.audiences
            .get(id)
            .map(|a| a.clone())
            .ok_or_else(|| AudienceError::not_found("audience", id))
    }

    /// Create a segment under an audience. The filter is validated by
    /// compiling it against the latest catalog, and that version is pinned
    /// on the segment.
    pub fn create_segment(
        &self,
        audience_id: &str,
        parent_audience_id: Option<String>,
        name: impl Into<String>,
        filter: FilterNode,
    ) -> AudienceResult<Segment> {
        if !self.audiences.contains_key(audience_id) {
            return Err(AudienceError::not_found("audience", audience_id));
        }
        if let Some(parent) = &parent_audience_id {
            if !self.audiences.contains_key(parent) {
                return Err(AudienceError::not_found("parent audience", parent.clone()));
            }
        }
        let version = CatalogVersion::latest();
        self.compiler.compile(&filter, version)?;

        let now = Utc::now();
        let segment = Segment {
            id: Uuid::new_v4(),
            audience_id: audience_id.to_string(),
            parent_audience_id,
            name: name.into(),
            filter,
            catalog_version: version,
            status: SegmentStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        info!(
            segment_id = %segment.id,
            audience_id = %segment.audience_id,
            name = %segment.name,
            catalog_version = %version,
            "created segment"
        );
        self.segments.insert(segment.id, segment.clone());
        Ok(segment)
    }

    pub fn get_segment(&self, id: Uuid) -> AudienceResult<Segment> {
        self.segments
            .get(&id)
            .map(|s| s.clone())
            .ok_or_else(|| AudienceError::not_found("segment", id.to_string()))
    }

    /// Replace a segment's filter. Re-validated against the latest catalog
    /// and re-pinned to it.
    pub fn update_filter(&self, id: Uuid, filter: FilterNode) -> AudienceResult<Segment> {
        let version = CatalogVersion::latest();
        self.compiler.compile(&filter, version)?;

        let mut entry = self
            .segments
            .get_mut(&id)
            .ok_or_else(|| AudienceError::not_found("segment", id.to_string()))?;
        entry.filter = filter;
        entry.catalog_version = version;
        entry.updated_at = Utc::now();
        info!(segment_id = %id, catalog_version = %version, "updated segment filter");
        Ok(entry.clone())
    }

    /// Apply a lifecycle transition, enforcing the state machine.
    pub fn transition(&self, id: Uuid, to: SegmentStatus) -> AudienceResult<Segment> {
        let mut entry = self
            .segments
            .get_mut(&id)
            .ok_or_else(|| AudienceError::not_found("segment", id.to_string()))?;
        if !entry.status.can_transition(to) {
            return Err(AudienceError::Validation(format!(
                "illegal status transition {} -> {} for segment '{}'",
                entry.status.as_str(),
                to.as_str(),
                id
            )));
        }
        entry.status = to;
        entry.updated_at = Utc::now();
        info!(segment_id = %id, status = to.as_str(), "segment status changed");
        Ok(entry.clone())
    }

    /// Remove a segment. Segments referenced by a sync config are archived
    /// (soft removal) instead of deleted. Returns the final segment state
    /// and whether it was archived.
    pub fn remove_segment(&self, id: Uuid) -> AudienceResult<(Segment, bool)> {
        if !self.segments.contains_key(&id) {
            return Err(AudienceError::not_found("segment", id.to_string()));
        }
        if self.is_sync_referenced(id) {
            let mut entry = self
                .segments
                .get_mut(&id)
                .ok_or_else(|| AudienceError::not_found("segment", id.to_string()))?;
            if entry.status != SegmentStatus::Archived {
                entry.status = SegmentStatus::Archived;
                entry.updated_at = Utc::now();
            }
            info!(segment_id = %id, "segment archived (referenced by sync)");
            return Ok((entry.clone(), true));
        }
        let (_, segment) = self
            .segments
            .remove(&id)
            .ok_or_else(|| AudienceError::not_found("segment", id.to_string()))?;
        info!(segment_id = %id, "segment removed");
        Ok((segment, false))
    }

    /// Segments of an audience, in creation order.
    ///
    /// Without a parent, returns only top-level segments. With a parent, the
    /// parent must exist — a missing parent is `NotFound`, never an empty
    /// list, so callers can distinguish "no children" from "invalid parent".
    /// Archived segments are excluded.
    pub fn list_segments(
        &self,
        audience_id: &str,
        parent_audience_id: Option<&str>,
    ) -> AudienceResult<Vec<Segment>> {
        if !self.audiences.contains_key(audience_id) {
            return Err(AudienceError::not_found("audience", audience_id));
        }
        if let Some(parent) = parent_audience_id {
            if !self.audiences.contains_key(parent) {
                return Err(AudienceError::not_found("parent audience", parent));
            }
        }
        let mut items: Vec<Segment> = self
            .segments
            .iter()
            .filter(|entry| {
                let s = entry.value();
                s.audience_id == audience_id
                    && s.parent_audience_id.as_deref() == parent_audience_id
                    && s.status != SegmentStatus::Archived
            })
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(items)
    }

    /// Register a sync of a segment to an ad-platform audience.
    pub fn register_sync(&self, config: SyncConfig) -> AudienceResult<SyncConfig> {
        if !self.segments.contains_key(&config.segment_id) {
            return Err(AudienceError::not_found(
                "segment",
                config.segment_id.to_string(),
            ));
        }
        info!(
            sync_id = %config.id,
            segment_id = %config.segment_id,
            ad_account_id = %config.ad_account_id,
            refresh_days = config.refresh_interval.days(),
            "registered sync config"
        );
        self.syncs.insert(config.id, config.clone());
        Ok(config)
    }

    pub fn syncs_for(&self, segment_id: Uuid) -> Vec<SyncConfig> {
        self.syncs
            .iter()
            .filter(|entry| entry.value().segment_id == segment_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn is_sync_referenced(&self, segment_id: Uuid) -> bool {
        self.syncs
            .iter()
            .any(|entry| entry.value().segment_id == segment_id)
    }
}
