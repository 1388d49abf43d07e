//! Donor compliance records: submission, lookup, and review.
//!
//! Each operation that touches two tables (KYC insert + contribution
//! advance, KYC verify + contribution completion) runs in one transaction.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::contributions::{parse_positive, store_error, MAX_LIMIT};
use crate::db;
use crate::errors::{ApiError, Entity};
use crate::models::{ContributionStatus, KycRecord, VerificationStatus};
use crate::validation::{self, KycSubmission, ReviewRequest};

const SUBMIT_FAILED: &str = "Failed to submit KYC information";
const UPDATE_FAILED: &str = "Failed to update KYC record";
const PENDING_FAILED: &str = "Failed to retrieve pending KYC verifications";

pub const DEFAULT_PENDING_LIMIT: u32 = 50;

/// Raw `GET /api/kyc/pending` query string.
#[derive(Debug, Default, Deserialize)]
pub struct PendingQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PendingPage {
    pub pending: Vec<KycRecord>,
    pub count: usize,
    pub limit: u32,
    pub offset: u64,
}

/// Validate a submission and store it as `pending`, moving the linked
/// contribution to `kyc_submitted`.
pub async fn submit(pool: &SqlitePool, sub: KycSubmission) -> Result<KycRecord, ApiError> {
    // The disclosure rule needs the contribution amount, so look it up
    // before deciding which fields are required.  A failed lookup does not
    // stop validation; it is reported once the input itself is known good.
    let lookup = match sub.contribution_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => db::get_contribution(pool, id).await,
        None => Ok(None),
    };
    let amount = lookup.as_ref().ok().and_then(|c| c.as_ref()).map(|c| c.amount);

    let new = validation::validate_kyc(sub, amount)?;
    match lookup {
        Ok(Some(_)) => {}
        Ok(None) => return Err(ApiError::NotFound(Entity::Contribution)),
        Err(e) => {
            warn!(contribution_id = %new.contribution_id, "contribution lookup failed: {e}");
            return Err(store_error(SUBMIT_FAILED, e));
        }
    }

    let now = Utc::now();
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiError::persistence(SUBMIT_FAILED, e))?;

    let record = db::insert_kyc_record(&mut tx, &new, now)
        .await
        .map_err(|e| store_error(SUBMIT_FAILED, e))?;
    let advanced = db::advance_contribution_status(
        &mut tx,
        &new.contribution_id,
        ContributionStatus::KycSubmitted,
        now,
    )
    .await
    .map_err(|e| store_error(SUBMIT_FAILED, e))?;

    tx.commit()
        .await
        .map_err(|e| ApiError::persistence(SUBMIT_FAILED, e))?;

    if !advanced {
        warn!(
            contribution_id = %new.contribution_id,
            "KYC resubmitted for a contribution already past pending"
        );
    }
    info!(
        kyc_id = %record.id,
        contribution_id = %record.contribution_id,
        "KYC submitted"
    );
    Ok(record)
}

/// Latest KYC record for a contribution.
pub async fn get(pool: &SqlitePool, contribution_id: Option<&str>) -> Result<KycRecord, ApiError> {
    let contribution_id = contribution_id
        .filter(|id| !id.is_empty())
        .ok_or(ApiError::MissingParameter("Contribution ID is required"))?;

    match db::get_kyc_for_contribution(pool, contribution_id).await {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(ApiError::NotFound(Entity::KycRecord)),
        Err(e) => {
            warn!("Error fetching KYC record for {contribution_id}: {e}");
            Err(ApiError::NotFound(Entity::KycRecord))
        }
    }
}

/// Apply a reviewer's decision.  `verified` completes the linked
/// contribution; every other status leaves it where it is, so a rejected
/// donor can resubmit against the same contribution.
pub async fn review(pool: &SqlitePool, req: ReviewRequest) -> Result<KycRecord, ApiError> {
    let decision = validation::validate_review(req)?;

    let now = Utc::now();
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| ApiError::persistence(UPDATE_FAILED, e))?;

    let record = db::update_kyc_status(
        &mut tx,
        &decision.kyc_id,
        decision.status,
        decision.notes.as_deref(),
        now,
    )
    .await
    .map_err(|e| store_error(UPDATE_FAILED, e))?;

    if decision.status == VerificationStatus::Verified {
        db::advance_contribution_status(
            &mut tx,
            &record.contribution_id,
            ContributionStatus::Completed,
            now,
        )
        .await
        .map_err(|e| store_error(UPDATE_FAILED, e))?;
    }

    tx.commit()
        .await
        .map_err(|e| ApiError::persistence(UPDATE_FAILED, e))?;

    info!(
        kyc_id = %record.id,
        status = decision.status.as_str(),
        "KYC review recorded"
    );
    Ok(record)
}

/// Reviewer queue: records still `pending`, oldest first.  `limit`
/// defaults to 50 and is capped like every other page size.
pub async fn pending(pool: &SqlitePool, query: PendingQuery) -> Result<PendingPage, ApiError> {
    let limit = parse_positive(query.limit.as_deref())
        .unwrap_or(DEFAULT_PENDING_LIMIT)
        .min(MAX_LIMIT);
    let offset = query
        .offset
        .as_deref()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let pending = db::list_pending_kyc(pool, limit, offset)
        .await
        .map_err(|e| store_error(PENDING_FAILED, e))?;
    Ok(PendingPage {
        count: pending.len(),
        pending,
        limit,
        offset,
    })
}
