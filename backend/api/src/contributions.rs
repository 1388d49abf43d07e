//! Contribution intake: create, read, and the list views (all
//! contributions, one donor's history, lookup by transaction hash).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::{self, ContributionFilter};
use crate::errors::{AppError, ApiError, Entity, FormatError};
use crate::models::Contribution;
use crate::validation::{self, ContributionRequest};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw `GET /api/contributions` query string.  Numbers arrive as strings so
/// garbage falls back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub campaign_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

#[derive(Debug, Clone)]
pub struct ContributionPage {
    pub contributions: Vec<Contribution>,
    pub pagination: Pagination,
}

/// Validate, check the campaign, and persist a `pending` contribution.
pub async fn create(pool: &SqlitePool, req: ContributionRequest) -> Result<Contribution, ApiError> {
    let new = validation::validate_contribution(req)?;

    match db::campaign_exists(pool, &new.campaign_id).await {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::NotFound(Entity::Campaign)),
        Err(e) => {
            warn!("Campaign lookup failed for {}: {e}", new.campaign_id);
            return Err(ApiError::NotFound(Entity::Campaign));
        }
    }

    let contribution = db::insert_contribution(pool, &new, Utc::now())
        .await
        .map_err(|e| store_error("Failed to create contribution", e))?;

    info!(
        id = %contribution.id,
        campaign_id = %contribution.campaign_id,
        amount = contribution.amount,
        currency = %contribution.currency,
        "contribution recorded"
    );
    Ok(contribution)
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<Contribution, ApiError> {
    db::get_contribution(pool, id)
        .await
        .map_err(|e| store_error("Failed to fetch contribution", e))?
        .ok_or(ApiError::NotFound(Entity::Contribution))
}

/// Contribution carrying `transaction_hash`.
pub async fn by_transaction_hash(
    pool: &SqlitePool,
    transaction_hash: &str,
) -> Result<Contribution, ApiError> {
    if !validation::is_valid_transaction_hash(transaction_hash) {
        return Err(ApiError::Format(FormatError::TransactionHash));
    }
    db::get_contribution_by_transaction_hash(pool, transaction_hash)
        .await
        .map_err(|e| store_error("Failed to get contribution status", e))?
        .ok_or(ApiError::NotFound(Entity::Transaction))
}

/// One page of contributions, newest first.
pub async fn list(pool: &SqlitePool, query: ListQuery) -> Result<ContributionPage, ApiError> {
    list_page(pool, query, None, "Failed to fetch contributions").await
}

/// One page of a single donor's contributions.  Any accepted wallet
/// spelling matches the stored canonical form.
pub async fn by_wallet(
    pool: &SqlitePool,
    wallet_address: &str,
    query: ListQuery,
) -> Result<ContributionPage, ApiError> {
    let wallet = validation::normalize_wallet_address(wallet_address)
        .ok_or(ApiError::Format(FormatError::WalletAddress))?;
    list_page(pool, query, Some(wallet), "Failed to get wallet contributions").await
}

async fn list_page(
    pool: &SqlitePool,
    query: ListQuery,
    wallet_address: Option<String>,
    context: &'static str,
) -> Result<ContributionPage, ApiError> {
    let page = parse_positive(query.page.as_deref()).unwrap_or(DEFAULT_PAGE);
    let limit = parse_positive(query.limit.as_deref())
        .unwrap_or(DEFAULT_LIMIT)
        .min(MAX_LIMIT);
    let offset = u64::from(page - 1) * u64::from(limit);

    let filter = ContributionFilter {
        campaign_id: query.campaign_id.filter(|s| !s.is_empty()),
        status: query.status.filter(|s| !s.is_empty()),
        wallet_address,
    };

    let (contributions, total) = db::list_contributions(pool, &filter, limit, offset)
        .await
        .map_err(|e| store_error(context, e))?;

    Ok(ContributionPage {
        contributions,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        },
    })
}

pub(crate) fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
}

fn total_pages(total: i64, limit: u32) -> i64 {
    let limit = i64::from(limit.max(1));
    (total + limit - 1) / limit
}

/// Store errors surface as persistence failures; anything else is unexpected.
pub(crate) fn store_error(context: &'static str, err: AppError) -> ApiError {
    match err {
        AppError::Database(e) => ApiError::persistence(context, e),
        other => ApiError::unexpected(context, other),
    }
}
