//! Records persisted by the service and the status enums that drive them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;

/// Lifecycle of a contribution.  Transitions only move forward:
/// `pending` → `kyc_submitted` → `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionStatus {
    /// Recorded, no donor information yet.
    Pending,
    /// A KYC record referencing this contribution exists.
    KycSubmitted,
    /// The linked KYC record was verified.
    Completed,
}

impl ContributionStatus {
    /// Return the identifier stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::KycSubmitted => "kyc_submitted",
            Self::Completed => "completed",
        }
    }

    /// States a contribution may be in immediately before entering `self`.
    pub fn predecessors(&self) -> &'static [ContributionStatus] {
        match self {
            Self::Pending => &[],
            Self::KycSubmitted => &[Self::Pending],
            Self::Completed => &[Self::Pending, Self::KycSubmitted],
        }
    }
}

/// Outcome of a compliance review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
    RequiresAdditionalInfo,
}

impl VerificationStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            "requires_additional_info" => Some(Self::RequiresAdditionalInfo),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::RequiresAdditionalInfo => "requires_additional_info",
        }
    }
}

/// A contribution row as stored in / read from the database.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Contribution {
    pub id: String,
    pub campaign_id: String,
    pub amount: f64,
    pub currency: String,
    pub transaction_hash: Option<String>,
    pub wallet_address: String,
    pub donor_info: Option<Json<Value>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated, normalized contribution ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewContribution {
    pub campaign_id: String,
    pub amount: f64,
    pub currency: String,
    pub transaction_hash: Option<String>,
    pub wallet_address: String,
    pub donor_info: Option<Value>,
}

/// A KYC row as stored in / read from the database.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct KycRecord {
    pub id: String,
    pub contribution_id: String,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub verification_status: String,
    pub verification_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated KYC submission ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewKycRecord {
    pub contribution_id: String,
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub occupation: Option<String>,
    pub employer: Option<String>,
}
