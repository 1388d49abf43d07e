//! Database layer — migrations, queries, and status transitions.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePoolOptions, types::Json, Sqlite, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
    Contribution, ContributionStatus, KycRecord, NewContribution, NewKycRecord, VerificationStatus,
};

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    // Make sure the file is created if it doesn't exist yet.
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };
    let url = if url.contains(":memory:") || url.contains("mode=") {
        url
    } else if url.contains('?') {
        format!("{url}&mode=rwc")
    } else {
        format!("{url}?mode=rwc")
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&url)
        .await?;

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

const CONTRIBUTION_COLUMNS: &str = "id, campaign_id, amount, currency, transaction_hash, \
     wallet_address, donor_info, status, created_at, updated_at";

const KYC_COLUMNS: &str = "id, contribution_id, full_name, email, address, city, state, \
     zip_code, country, occupation, employer, verification_status, verification_notes, \
     created_at, updated_at";

// ─────────────────────────────────────────────────────────
// Campaigns
// ─────────────────────────────────────────────────────────

pub async fn campaign_exists(pool: &SqlitePool, campaign_id: &str) -> Result<bool> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM campaigns WHERE id = ?1")
        .bind(campaign_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

// ─────────────────────────────────────────────────────────
// Contributions
// ─────────────────────────────────────────────────────────

pub async fn insert_contribution(
    pool: &SqlitePool,
    new: &NewContribution,
    now: DateTime<Utc>,
) -> Result<Contribution> {
    let sql = format!(
        r#"
        INSERT INTO contributions
            (id, campaign_id, amount, currency, transaction_hash, wallet_address,
             donor_info, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        RETURNING {CONTRIBUTION_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, Contribution>(&sql)
        .bind(Uuid::new_v4().to_string())
        .bind(&new.campaign_id)
        .bind(new.amount)
        .bind(&new.currency)
        .bind(&new.transaction_hash)
        .bind(&new.wallet_address)
        .bind(new.donor_info.as_ref().map(Json))
        .bind(ContributionStatus::Pending.as_str())
        .bind(now)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

pub async fn get_contribution(pool: &SqlitePool, id: &str) -> Result<Option<Contribution>> {
    let sql = format!("SELECT {CONTRIBUTION_COLUMNS} FROM contributions WHERE id = ?1");
    let row = sqlx::query_as::<_, Contribution>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Most recent contribution recorded with this transaction hash.
pub async fn get_contribution_by_transaction_hash(
    pool: &SqlitePool,
    transaction_hash: &str,
) -> Result<Option<Contribution>> {
    let sql = format!(
        r#"
        SELECT {CONTRIBUTION_COLUMNS}
        FROM   contributions
        WHERE  transaction_hash = ?1
        ORDER  BY created_at DESC, rowid DESC
        LIMIT  1
        "#
    );
    let row = sqlx::query_as::<_, Contribution>(&sql)
        .bind(transaction_hash)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Optional predicates for [`list_contributions`].  `wallet_address` is
/// compared against the stored lower-case form.
#[derive(Debug, Clone, Default)]
pub struct ContributionFilter {
    pub campaign_id: Option<String>,
    pub status: Option<String>,
    pub wallet_address: Option<String>,
}

/// Fetch one page of contributions, newest first, plus the total number of
/// rows matching the filter.
pub async fn list_contributions(
    pool: &SqlitePool,
    filter: &ContributionFilter,
    limit: u32,
    offset: u64,
) -> Result<(Vec<Contribution>, i64)> {
    let sql = format!(
        r#"
        SELECT {CONTRIBUTION_COLUMNS}
        FROM   contributions
        WHERE  (?1 IS NULL OR campaign_id = ?1)
          AND  (?2 IS NULL OR status = ?2)
          AND  (?3 IS NULL OR wallet_address = ?3)
        ORDER  BY created_at DESC, rowid DESC
        LIMIT  ?4 OFFSET ?5
        "#
    );
    let rows = sqlx::query_as::<_, Contribution>(&sql)
        .bind(&filter.campaign_id)
        .bind(&filter.status)
        .bind(&filter.wallet_address)
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM   contributions
        WHERE  (?1 IS NULL OR campaign_id = ?1)
          AND  (?2 IS NULL OR status = ?2)
          AND  (?3 IS NULL OR wallet_address = ?3)
        "#,
    )
    .bind(&filter.campaign_id)
    .bind(&filter.status)
    .bind(&filter.wallet_address)
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}

/// Move a contribution forward to `next`.  Rows already at or past `next`
/// are left untouched, so status never regresses.  Returns whether a row
/// changed.
pub async fn advance_contribution_status(
    conn: &mut SqliteConnection,
    id: &str,
    next: ContributionStatus,
    now: DateTime<Utc>,
) -> Result<bool> {
    let allowed = next.predecessors();
    if allowed.is_empty() {
        return Ok(false);
    }

    let mut qb = sqlx::QueryBuilder::<Sqlite>::new("UPDATE contributions SET status = ");
    qb.push_bind(next.as_str())
        .push(", updated_at = ")
        .push_bind(now)
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND status IN (");
    let mut sep = qb.separated(", ");
    for status in allowed {
        sep.push_bind(status.as_str());
    }
    sep.push_unseparated(")");

    let rows = qb.build().execute(conn).await?.rows_affected();
    Ok(rows > 0)
}

// ─────────────────────────────────────────────────────────
// KYC records
// ─────────────────────────────────────────────────────────

pub async fn insert_kyc_record(
    conn: &mut SqliteConnection,
    new: &NewKycRecord,
    now: DateTime<Utc>,
) -> Result<KycRecord> {
    let sql = format!(
        r#"
        INSERT INTO kyc_records
            (id, contribution_id, full_name, email, address, city, state, zip_code,
             country, occupation, employer, verification_status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        RETURNING {KYC_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, KycRecord>(&sql)
        .bind(Uuid::new_v4().to_string())
        .bind(&new.contribution_id)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.zip_code)
        .bind(&new.country)
        .bind(&new.occupation)
        .bind(&new.employer)
        .bind(VerificationStatus::Pending.as_str())
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

/// Latest KYC record submitted for a contribution.
pub async fn get_kyc_for_contribution(
    pool: &SqlitePool,
    contribution_id: &str,
) -> Result<Option<KycRecord>> {
    let sql = format!(
        r#"
        SELECT {KYC_COLUMNS}
        FROM   kyc_records
        WHERE  contribution_id = ?1
        ORDER  BY created_at DESC, rowid DESC
        LIMIT  1
        "#
    );
    let row = sqlx::query_as::<_, KycRecord>(&sql)
        .bind(contribution_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Records still awaiting review, oldest first.
pub async fn list_pending_kyc(
    pool: &SqlitePool,
    limit: u32,
    offset: u64,
) -> Result<Vec<KycRecord>> {
    let sql = format!(
        r#"
        SELECT {KYC_COLUMNS}
        FROM   kyc_records
        WHERE  verification_status = ?1
        ORDER  BY created_at ASC, rowid ASC
        LIMIT  ?2 OFFSET ?3
        "#
    );
    let rows = sqlx::query_as::<_, KycRecord>(&sql)
        .bind(VerificationStatus::Pending.as_str())
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Set a record's verification status.  `notes`, when given, replaces the
/// stored notes; otherwise they are kept.  Fails with
/// [`sqlx::Error::RowNotFound`] when no record has that id.
pub async fn update_kyc_status(
    conn: &mut SqliteConnection,
    kyc_id: &str,
    status: VerificationStatus,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<KycRecord> {
    let sql = format!(
        r#"
        UPDATE kyc_records
        SET    verification_status = ?1,
               verification_notes  = COALESCE(?2, verification_notes),
               updated_at          = ?3
        WHERE  id = ?4
        RETURNING {KYC_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, KycRecord>(&sql)
        .bind(status.as_str())
        .bind(notes)
        .bind(now)
        .bind(kyc_id)
        .fetch_one(conn)
        .await?;
    Ok(row)
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
