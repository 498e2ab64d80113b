//! Commission calculator - turns a commissionable event into an affiliate commission.
//!
//! The commission type follows from the event that produced it, and whether the
//! commission needs manual verification is a fixed property of the type. Commissions
//! that need no verification are approved and credited in the same transaction they
//! are created in; the rest wait in PENDING for an admin to approve or reject them.

use crate::{
    core::{ledger, referral, user},
    entities::{AffiliateCommission, affiliate_commission},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Kind of event a commission was earned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionType {
    /// Academy course enrollment
    Academy,
    /// Copy-trading subscription
    CopyTrading,
    /// Funded broker account opened through a referral link
    BrokerAccount,
    /// Platform subscription purchase
    Subscription,
}

impl CommissionType {
    /// Stored representation of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Academy => "ACADEMY",
            Self::CopyTrading => "COPY_TRADING",
            Self::BrokerAccount => "BROKER_ACCOUNT",
            Self::Subscription => "SUBSCRIPTION",
        }
    }

    /// Whether commissions of this type wait for an admin before counting as earnings.
    ///
    /// Copy-trading and broker deposits happen off-platform and cannot be confirmed
    /// without a human looking at them.
    #[must_use]
    pub const fn requires_verification(self) -> bool {
        match self {
            Self::Academy | Self::Subscription => false,
            Self::CopyTrading | Self::BrokerAccount => true,
        }
    }
}

impl fmt::Display for CommissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommissionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ACADEMY" => Ok(Self::Academy),
            "COPY_TRADING" => Ok(Self::CopyTrading),
            "BROKER_ACCOUNT" => Ok(Self::BrokerAccount),
            "SUBSCRIPTION" => Ok(Self::Subscription),
            other => Err(Error::InvalidStatus {
                kind: "commission type",
                value: other.to_string(),
            }),
        }
    }
}

/// Review state of a commission. APPROVED and REJECTED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionStatus {
    /// Waiting for verification
    Pending,
    /// Credited to the affiliate's earnings
    Approved,
    /// Refused; never credited
    Rejected,
}

impl CommissionStatus {
    /// Stored representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for CommissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommissionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(Error::InvalidStatus {
                kind: "commission status",
                value: other.to_string(),
            }),
        }
    }
}

/// The platform record a commission was earned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelatedEntity {
    /// Academy registration id
    AcademyRegistration(String),
    /// Copy-trading subscription id
    CopyTradingSubscription(String),
    /// Broker account opening id
    BrokerAccountOpening(String),
    /// Subscription id
    Subscription(String),
}

impl RelatedEntity {
    /// Stored entity-type names, one per variant.
    pub const KINDS: [&'static str; 4] = [
        "ACADEMY_REGISTRATION",
        "COPY_TRADING_SUBSCRIPTION",
        "BROKER_ACCOUNT_OPENING",
        "SUBSCRIPTION",
    ];

    /// Stored entity-type name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AcademyRegistration(_) => "ACADEMY_REGISTRATION",
            Self::CopyTradingSubscription(_) => "COPY_TRADING_SUBSCRIPTION",
            Self::BrokerAccountOpening(_) => "BROKER_ACCOUNT_OPENING",
            Self::Subscription(_) => "SUBSCRIPTION",
        }
    }

    /// Id of the related record.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::AcademyRegistration(id)
            | Self::CopyTradingSubscription(id)
            | Self::BrokerAccountOpening(id)
            | Self::Subscription(id) => id,
        }
    }

    /// Commission type earned on this kind of record.
    #[must_use]
    pub const fn commission_type(&self) -> CommissionType {
        match self {
            Self::AcademyRegistration(_) => CommissionType::Academy,
            Self::CopyTradingSubscription(_) => CommissionType::CopyTrading,
            Self::BrokerAccountOpening(_) => CommissionType::BrokerAccount,
            Self::Subscription(_) => CommissionType::Subscription,
        }
    }

    /// Rebuilds the variant from its stored (type, id) pair.
    pub fn from_parts(kind: &str, id: &str) -> Result<Self> {
        let id = id.to_string();
        match kind {
            "ACADEMY_REGISTRATION" => Ok(Self::AcademyRegistration(id)),
            "COPY_TRADING_SUBSCRIPTION" => Ok(Self::CopyTradingSubscription(id)),
            "BROKER_ACCOUNT_OPENING" => Ok(Self::BrokerAccountOpening(id)),
            "SUBSCRIPTION" => Ok(Self::Subscription(id)),
            other => Err(Error::InvalidStatus {
                kind: "related entity type",
                value: other.to_string(),
            }),
        }
    }
}

/// Reads the related entity back out of a stored commission.
pub fn related_entity(commission: &affiliate_commission::Model) -> Result<RelatedEntity> {
    RelatedEntity::from_parts(
        &commission.related_entity_type,
        &commission.related_entity_id,
    )
}

/// Rounds a dollar amount to whole cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `base_amount * rate_percent / 100`, rounded to cents.
#[must_use]
pub fn calculate_commission_amount(base_amount: f64, rate_percent: f64) -> f64 {
    round_cents(base_amount * rate_percent / 100.0)
}

/// Creates a commission for an affiliate at the affiliate's current rate.
///
/// If the commission type needs no verification, the commission is stored APPROVED
/// and the affiliate is credited inside the same transaction. Otherwise it is stored
/// PENDING and the affiliate's earnings are untouched.
pub async fn create_commission(
    db: &DatabaseConnection,
    affiliate_program_id: i64,
    referred_user_id: &str,
    base_amount: f64,
    related: RelatedEntity,
    verification_data: Option<Json>,
) -> Result<affiliate_commission::Model> {
    if !base_amount.is_finite() || base_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: base_amount,
        });
    }

    let txn = db.begin().await?;

    let program = crate::core::affiliate::get_program_by_id(&txn, affiliate_program_id).await?;
    let commission_type = related.commission_type();
    let requires_verification = commission_type.requires_verification();
    let amount = calculate_commission_amount(base_amount, program.commission_rate);
    let now = chrono::Utc::now();

    let (status, processed_at) = if requires_verification {
        (CommissionStatus::Pending, None)
    } else {
        (CommissionStatus::Approved, Some(now))
    };

    let commission = affiliate_commission::ActiveModel {
        affiliate_program_id: Set(program.id),
        referred_user_id: Set(referred_user_id.to_string()),
        base_amount: Set(base_amount),
        amount: Set(amount),
        commission_type: Set(commission_type.as_str().to_string()),
        status: Set(status.as_str().to_string()),
        requires_verification: Set(requires_verification),
        verification_data: Set(verification_data),
        related_entity_type: Set(related.kind().to_string()),
        related_entity_id: Set(related.id().to_string()),
        rejection_reason: Set(None),
        created_at: Set(now),
        processed_at: Set(processed_at),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if !requires_verification {
        ledger::apply_approved(&txn, program.id, referred_user_id, amount).await?;
    }

    txn.commit().await?;

    info!(
        "Commission {} of ${:.2} ({}, {}) for affiliate {}",
        commission.id, amount, commission_type, status, program.affiliate_code
    );
    Ok(commission)
}

/// Creates a commission for whoever referred `referred_user_id`, if anyone did.
///
/// Returns `None` when the user signed up without a code or the referring program no
/// longer exists or is inactive.
pub async fn record_commission_for_user(
    db: &DatabaseConnection,
    referred_user_id: &str,
    base_amount: f64,
    related: RelatedEntity,
    verification_data: Option<Json>,
) -> Result<Option<affiliate_commission::Model>> {
    let referred = user::require_user(db, referred_user_id).await?;

    let Some(code) = referred.referred_by_code else {
        debug!("User {} was not referred, no commission", referred_user_id);
        return Ok(None);
    };

    let program = match referral::find_program_by_code(db, &code).await? {
        Some(program) if program.is_active => program,
        _ => {
            debug!(
                "Referral code {} of user {} has no active program, no commission",
                code, referred_user_id
            );
            return Ok(None);
        }
    };

    create_commission(
        db,
        program.id,
        referred_user_id,
        base_amount,
        related,
        verification_data,
    )
    .await
    .map(Some)
}

/// Retrieves a commission by id.
pub async fn get_commission_by_id<C>(
    db: &C,
    commission_id: i64,
) -> Result<Option<affiliate_commission::Model>>
where
    C: ConnectionTrait,
{
    AffiliateCommission::find_by_id(commission_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists commissions waiting for verification, oldest first.
pub async fn list_pending_commissions(
    db: &DatabaseConnection,
) -> Result<Vec<affiliate_commission::Model>> {
    AffiliateCommission::find()
        .filter(affiliate_commission::Column::Status.eq(CommissionStatus::Pending.as_str()))
        .order_by_asc(affiliate_commission::Column::CreatedAt)
        .order_by_asc(affiliate_commission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Lists an affiliate's commissions, newest first.
pub async fn list_commissions_for_program<C>(
    db: &C,
    affiliate_program_id: i64,
) -> Result<Vec<affiliate_commission::Model>>
where
    C: ConnectionTrait,
{
    AffiliateCommission::find()
        .filter(affiliate_commission::Column::AffiliateProgramId.eq(affiliate_program_id))
        .order_by_desc(affiliate_commission::Column::CreatedAt)
        .order_by_desc(affiliate_commission::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Explains why a commission could not be moved out of PENDING.
async fn not_pending_error<C>(db: &C, commission_id: i64) -> Result<Error>
where
    C: ConnectionTrait,
{
    Ok(match get_commission_by_id(db, commission_id).await? {
        Some(commission) => Error::CommissionAlreadyProcessed {
            id: commission_id,
            status: commission.status,
        },
        None => Error::CommissionNotFound { id: commission_id },
    })
}

/// Moves a commission out of PENDING with a single conditional UPDATE.
///
/// The status guard sits in the WHERE clause, so a commission that left PENDING after
/// the caller last looked at it is never overwritten.
pub(crate) async fn finish_pending<C>(
    db: &C,
    commission_id: i64,
    status: CommissionStatus,
    rejection_reason: Option<String>,
) -> Result<affiliate_commission::Model>
where
    C: ConnectionTrait,
{
    let result = AffiliateCommission::update_many()
        .col_expr(
            affiliate_commission::Column::Status,
            Expr::value(status.as_str()),
        )
        .col_expr(
            affiliate_commission::Column::RejectionReason,
            Expr::value(rejection_reason),
        )
        .col_expr(
            affiliate_commission::Column::ProcessedAt,
            Expr::value(Some(chrono::Utc::now())),
        )
        .filter(affiliate_commission::Column::Id.eq(commission_id))
        .filter(affiliate_commission::Column::Status.eq(CommissionStatus::Pending.as_str()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(not_pending_error(db, commission_id).await?);
    }

    get_commission_by_id(db, commission_id)
        .await?
        .ok_or(Error::CommissionNotFound { id: commission_id })
}

/// Approves a PENDING commission and credits the affiliate in one transaction.
pub async fn approve_commission(
    db: &DatabaseConnection,
    commission_id: i64,
) -> Result<affiliate_commission::Model> {
    let txn = db.begin().await?;

    let commission =
        finish_pending(&txn, commission_id, CommissionStatus::Approved, None).await?;
    ledger::apply_approved(
        &txn,
        commission.affiliate_program_id,
        &commission.referred_user_id,
        commission.amount,
    )
    .await?;

    txn.commit().await?;

    info!(
        "Commission {} approved, ${:.2} credited to program {}",
        commission_id, commission.amount, commission.affiliate_program_id
    );
    Ok(commission)
}

/// Rejects a PENDING commission. Nothing was credited for it, so earnings are untouched.
pub async fn reject_commission(
    db: &DatabaseConnection,
    commission_id: i64,
    reason: Option<String>,
) -> Result<affiliate_commission::Model> {
    let txn = db.begin().await?;
    let commission =
        finish_pending(&txn, commission_id, CommissionStatus::Rejected, reason).await?;
    txn.commit().await?;

    info!("Commission {} rejected", commission_id);
    Ok(commission)
}
