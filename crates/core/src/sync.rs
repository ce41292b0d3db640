//! Ad-platform sync configuration types.
//!
//! The sync protocol itself lives in an external collaborator; this module
//! only models the configuration it accepts — a compiled segment reference,
//! an ad account, a destination audience, and a refresh cadence drawn from
//! a fixed enumerated set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AudienceError;

/// Allowed refresh cadences, in days. Closed set — anything else is a
/// validation error at the boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u32", into = "u32")]
pub enum RefreshInterval {
    Daily,
    ThreeDays,
    Weekly,
    TwoWeeks,
    Monthly,
}

impl RefreshInterval {
    pub const ALLOWED_DAYS: [u32; 5] = [1, 3, 7, 14, 30];

    pub fn days(&self) -> u32 {
        match self {
            RefreshInterval::Daily => 1,
            RefreshInterval::ThreeDays => 3,
            RefreshInterval::Weekly => 7,
            RefreshInterval::TwoWeeks => 14,
            RefreshInterval::Monthly => 30,
        }
    }
}

impl TryFrom<u32> for RefreshInterval {
    type Error = AudienceError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            1 => Ok(RefreshInterval::Daily),
            3 => Ok(RefreshInterval::ThreeDays),
            7 => Ok(RefreshInterval::Weekly),
            14 => Ok(RefreshInterval::TwoWeeks),
            30 => Ok(RefreshInterval::Monthly),
            other => Err(AudienceError::Validation(format!(
                "refresh interval must be one of {:?} days, got {}",
                Self::ALLOWED_DAYS,
                other
            ))),
        }
    }
}

impl From<RefreshInterval> for u32 {
    fn from(interval: RefreshInterval) -> u32 {
        interval.days()
    }
}

/// A registered sync of one segment to one ad-platform audience.
///
/// A segment referenced by at least one sync config is soft-removed
/// (archived) instead of hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub id: Uuid,
    pub segment_id: Uuid,
    pub ad_account_id: String,
    pub destination_audience_id: String,
    pub refresh_interval: RefreshInterval,
    pub created_at: DateTime<Utc>,
}

impl SyncConfig {
    pub fn new(
        segment_id: Uuid,
        ad_account_id: impl Into<String>,
        destination_audience_id: impl Into<String>,
        refresh_interval: RefreshInterval,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            segment_id,
            ad_account_id: ad_account_id.into(),
            destination_audience_id: destination_audience_id.into(),
            refresh_interval,
            created_at: Utc::now(),
        }
    }
}
