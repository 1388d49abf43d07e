//! Request shapes and the validation rules applied to them before anything
//! touches the database.
//!
//! Validation is two-tier: required-field checks are aggregated into a single
//! [`FieldErrors`] map, and format checks (wallet address, transaction hash,
//! email) only run once that map is empty.  Each format failure is reported
//! on its own.

use serde::Deserialize;
use serde_json::Value;
use sha3::{Digest, Keccak256};

use crate::errors::{ApiError, FieldErrors, FormatError};
use crate::models::{NewContribution, NewKycRecord, VerificationStatus};

/// Contributions strictly above this amount must disclose occupation and
/// employer (FEC itemization threshold, USD).
pub const DISCLOSURE_THRESHOLD: f64 = 200.0;

// ─────────────────────────────────────────────────────────
// Request shapes
// ─────────────────────────────────────────────────────────

/// `POST /api/contributions` body.
#[derive(Debug, Default, Deserialize)]
pub struct ContributionRequest {
    pub campaign_id: Option<String>,
    /// Number or numeric string.
    pub amount: Option<Value>,
    pub currency: Option<String>,
    pub transaction_hash: Option<String>,
    pub wallet_address: Option<String>,
    pub donor_info: Option<Value>,
}

/// `POST /api/kyc` body.
#[derive(Debug, Default, Deserialize)]
pub struct KycSubmission {
    pub contribution_id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub occupation: Option<String>,
    pub employer: Option<String>,
}

/// `PUT /api/kyc` body.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub kyc_id: Option<String>,
    pub verification_status: Option<String>,
    pub notes: Option<String>,
}

/// A review request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDecision {
    pub kyc_id: String,
    pub status: VerificationStatus,
    pub notes: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Contributions
// ─────────────────────────────────────────────────────────

/// Check and normalize a contribution request.  Campaign existence is
/// checked separately since it needs the store.
pub fn validate_contribution(req: ContributionRequest) -> Result<NewContribution, ApiError> {
    let campaign_id = present(req.campaign_id);
    let amount = req.amount.as_ref().and_then(parse_amount);
    let currency = present(req.currency);
    let wallet_address = present(req.wallet_address);

    let mut errors = FieldErrors::new();
    if campaign_id.is_none() {
        errors.insert("campaign_id", "Campaign ID is required".to_string());
    }
    if !amount.is_some_and(|a| a > 0.0) {
        errors.insert("amount", "Valid amount is required".to_string());
    }
    if currency.is_none() {
        errors.insert("currency", "Currency is required".to_string());
    }
    if wallet_address.is_none() {
        errors.insert("wallet_address", "Wallet address is required".to_string());
    }

    let (Some(campaign_id), Some(amount), Some(currency), Some(wallet_address)) =
        (campaign_id, amount, currency, wallet_address)
    else {
        return Err(ApiError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let wallet_address = normalize_wallet_address(&wallet_address)
        .ok_or(ApiError::Format(FormatError::WalletAddress))?;

    let transaction_hash = present(req.transaction_hash);
    if let Some(hash) = &transaction_hash {
        if !is_valid_transaction_hash(hash) {
            return Err(ApiError::Format(FormatError::TransactionHash));
        }
    }

    Ok(NewContribution {
        campaign_id,
        amount,
        currency: currency.to_uppercase(),
        transaction_hash,
        wallet_address,
        donor_info: req.donor_info.filter(|v| !v.is_null()),
    })
}

/// Accept a JSON number or a numeric string.  Anything else, including
/// non-finite values, is treated as missing.
pub fn parse_amount(raw: &Value) -> Option<f64> {
    let amount = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    amount.is_finite().then_some(amount)
}

/// Canonical lower-case `0x…` form of a wallet address, or `None` when the
/// input is not one.
///
/// Accepted spellings:
/// * 40 hex digits with an optional `0x` prefix.  Mixed-case input must
///   carry a valid EIP-55 checksum; all-lower and all-upper input is taken
///   as is.
/// * An ICAP direct address (`XE` + two check digits + 30-31 base-36
///   digits) whose IBAN checksum holds and whose value fits in 160 bits.
pub fn normalize_wallet_address(address: &str) -> Option<String> {
    if address.starts_with("XE") {
        return icap_to_hex(address).map(|hex| format!("0x{hex}"));
    }

    let body = address.strip_prefix("0x").unwrap_or(address);
    if body.len() != 40 || hex::decode(body).is_err() {
        return None;
    }

    let has_lower = body.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = body.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper && body != eip55_checksum(body) {
        return None;
    }
    Some(format!("0x{}", body.to_ascii_lowercase()))
}

fn icap_to_hex(icap: &str) -> Option<String> {
    let body = icap.strip_prefix("XE")?;
    if !(32..=33).contains(&body.len()) || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    let (check, bban) = body.split_at(2);
    if check != iban_checksum(bban) {
        return None;
    }

    // Big-endian base-36 → 160-bit conversion; overflow means no address.
    let mut value = [0u8; 20];
    for c in bban.chars() {
        let mut carry = c.to_digit(36)?;
        for byte in value.iter_mut().rev() {
            let acc = u32::from(*byte) * 36 + carry;
            *byte = (acc & 0xff) as u8;
            carry = acc >> 8;
        }
        if carry != 0 {
            return None;
        }
    }
    Some(hex::encode(value))
}

/// ISO 13616 check digits for an `XE` account identifier.
fn iban_checksum(bban: &str) -> String {
    let remainder = bban
        .chars()
        .chain("XE00".chars())
        .filter_map(|c| c.to_digit(36))
        .fold(0u32, |rem, d| {
            if d < 10 {
                (rem * 10 + d) % 97
            } else {
                (rem * 100 + d) % 97
            }
        });
    format!("{:02}", 98 - remainder)
}

fn eip55_checksum(body: &str) -> String {
    let lower = body.to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let byte = hash[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// `^0x[a-fA-F0-9]{64}$`
pub fn is_valid_transaction_hash(hash: &str) -> bool {
    hash.strip_prefix("0x")
        .is_some_and(|body| body.len() == 64 && hex::decode(body).is_ok())
}

// ─────────────────────────────────────────────────────────
// KYC
// ─────────────────────────────────────────────────────────

pub fn requires_employment_disclosure(amount: f64) -> bool {
    amount > DISCLOSURE_THRESHOLD
}

/// Collect every missing required field.  `contribution_amount` is the
/// amount of the linked contribution when it could be found; above the
/// disclosure threshold occupation and employer join the required set.
pub fn kyc_field_errors(sub: &KycSubmission, contribution_amount: Option<f64>) -> FieldErrors {
    let required: [(&'static str, &Option<String>, &str); 8] = [
        ("contribution_id", &sub.contribution_id, "Contribution ID is required"),
        ("full_name", &sub.full_name, "Full name is required"),
        ("email", &sub.email, "Email is required"),
        ("address", &sub.address, "Address is required"),
        ("city", &sub.city, "City is required"),
        ("state", &sub.state, "State is required"),
        ("zip_code", &sub.zip_code, "ZIP code is required"),
        ("country", &sub.country, "Country is required"),
    ];

    let mut errors = FieldErrors::new();
    for (field, value, message) in required {
        if is_blank(value) {
            errors.insert(field, message.to_string());
        }
    }

    if contribution_amount.is_some_and(requires_employment_disclosure) {
        if is_blank(&sub.occupation) {
            errors.insert(
                "occupation",
                "Occupation is required for contributions over $200".to_string(),
            );
        }
        if is_blank(&sub.employer) {
            errors.insert(
                "employer",
                "Employer is required for contributions over $200".to_string(),
            );
        }
    }
    errors
}

/// Full KYC validation: required fields, disclosure rule, then email format.
pub fn validate_kyc(
    sub: KycSubmission,
    contribution_amount: Option<f64>,
) -> Result<NewKycRecord, ApiError> {
    let errors = kyc_field_errors(&sub, contribution_amount);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let field = |value: Option<String>| value.unwrap_or_default();
    let email = field(sub.email);
    if !is_valid_email(&email) {
        return Err(ApiError::Format(FormatError::Email));
    }

    Ok(NewKycRecord {
        contribution_id: field(sub.contribution_id),
        full_name: field(sub.full_name),
        email,
        address: field(sub.address),
        city: field(sub.city),
        state: field(sub.state),
        zip_code: field(sub.zip_code),
        country: field(sub.country),
        occupation: present(sub.occupation),
        employer: present(sub.employer),
    })
}

/// `local@domain.tld`: no whitespace, one `@`, and a dot inside the domain
/// with text on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn validate_review(req: ReviewRequest) -> Result<ReviewDecision, ApiError> {
    let (Some(kyc_id), Some(raw_status)) = (present(req.kyc_id), present(req.verification_status))
    else {
        return Err(ApiError::MissingParameter(
            "KYC ID and verification status are required",
        ));
    };
    let status = VerificationStatus::parse(&raw_status)
        .ok_or(ApiError::Format(FormatError::VerificationStatus))?;

    Ok(ReviewDecision {
        kyc_id,
        status,
        notes: present(req.notes),
    })
}

// ─────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────

/// Empty strings count as missing.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
