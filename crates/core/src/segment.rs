//! Audiences, segments, and the segment lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::fields::CatalogVersion;
use crate::filter::FilterNode;

/// A named collection of identities/events. Audiences may nest; the parent
/// chain must terminate (no cycles).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Audience {
    pub id: String,
    pub name: String,
    pub parent_audience_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Audience {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_audience_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn nested(
        id: impl Into<String>,
        name: impl Into<String>,
        parent: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_audience_id: Some(parent.into()),
            created_at: Utc::now(),
        }
    }
}

/// Lifecycle state of a segment.
///
/// `draft -> active -> refreshing -> active` is the recompute cycle,
/// `active -> failed -> active` the retry path after an upstream error, and
/// `archived` is terminal, reachable from any state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Draft,
    Active,
    Refreshing,
    Failed,
    Archived,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Draft => "draft",
            SegmentStatus::Active => "active",
            SegmentStatus::Refreshing => "refreshing",
            SegmentStatus::Failed => "failed",
            SegmentStatus::Archived => "archived",
        }
    }

    pub fn can_transition(self, to: SegmentStatus) -> bool {
        use SegmentStatus::*;
        match (self, to) {
            (Archived, _) => false,
            (_, Archived) => true,
            (Draft, Active) => true,
            (Active, Refreshing) | (Active, Failed) => true,
            (Refreshing, Active) | (Refreshing, Failed) => true,
            (Failed, Active) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SegmentStatus::Archived)
    }
}

/// A named, persisted filter scoped to an audience. `catalog_version` is
/// pinned when the filter is saved, so vocabulary upgrades never change the
/// compiled output of an existing segment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Segment {
    pub id: Uuid,
    pub audience_id: String,
    pub parent_audience_id: Option<String>,
    pub name: String,
    #[schema(value_type = Object)]
    pub filter: FilterNode,
    pub catalog_version: CatalogVersion,
    pub status: SegmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
