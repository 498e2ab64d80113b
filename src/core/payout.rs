//! Payout processor - creates payouts and moves them between PENDING, COMPLETED and FAILED.
//!
//! Only two transitions exist, both out of PENDING, and each one carries its earnings
//! effect (see `core::ledger`). The payout row and the earnings change commit together.

use crate::{
    core::{affiliate, ledger},
    entities::{AffiliatePayout, AffiliateProgramModel, affiliate_payout},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// State of a payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutStatus {
    /// Requested, not yet paid
    Pending,
    /// Money left the platform
    Completed,
    /// Payment attempt failed
    Failed,
}

impl PayoutStatus {
    /// Stored representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Completed, Self::Failed];
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(Error::InvalidStatus {
                kind: "payout status",
                value: s.to_string(),
            }),
        }
    }
}

/// Earnings effect of an allowed payout transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayoutEffect {
    /// `paid += amount`, `pending = max(0, pending - amount)`
    Settle,
    /// `pending += amount`
    Restore,
}

/// Looks up the earnings effect of moving a payout from `from` to `to`.
///
/// Every pair other than PENDING -> COMPLETED and PENDING -> FAILED is refused.
pub fn transition_effect(from: PayoutStatus, to: PayoutStatus) -> Result<PayoutEffect> {
    match (from, to) {
        (PayoutStatus::Pending, PayoutStatus::Completed) => Ok(PayoutEffect::Settle),
        (PayoutStatus::Pending, PayoutStatus::Failed) => Ok(PayoutEffect::Restore),
        (PayoutStatus::Pending, PayoutStatus::Pending)
        | (PayoutStatus::Completed | PayoutStatus::Failed, _) => {
            Err(Error::InvalidPayoutTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// A payout after a transition together with the affiliate's updated earnings.
#[derive(Debug, Clone)]
pub struct PayoutTransition {
    /// The updated payout row
    pub payout: affiliate_payout::Model,
    /// The owning program after its earnings were adjusted
    pub program: AffiliateProgramModel,
}

/// Inserts a PENDING payout row. Earnings are not touched.
pub(crate) async fn insert_payout<C>(
    db: &C,
    affiliate_program_id: i64,
    amount: f64,
    method: String,
    notes: Option<String>,
) -> Result<affiliate_payout::Model>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    if method.trim().is_empty() {
        return Err(Error::Config {
            message: "Payout method cannot be empty".to_string(),
        });
    }

    affiliate_payout::ActiveModel {
        affiliate_program_id: Set(affiliate_program_id),
        amount: Set(amount),
        method: Set(method.trim().to_string()),
        status: Set(PayoutStatus::Pending.as_str().to_string()),
        transaction_id: Set(None),
        notes: Set(notes),
        paid_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a manual payout for an affiliate (admin action).
///
/// The payout starts PENDING; earnings only move when it is completed or fails.
pub async fn create_payout(
    db: &DatabaseConnection,
    affiliate_program_id: i64,
    amount: f64,
    method: String,
    notes: Option<String>,
) -> Result<affiliate_payout::Model> {
    let program = affiliate::get_program_by_id(db, affiliate_program_id).await?;
    let payout = insert_payout(db, program.id, amount, method, notes).await?;
    info!(
        "Created payout {} of ${:.2} for affiliate {}",
        payout.id, amount, program.affiliate_code
    );
    Ok(payout)
}

/// Retrieves a payout by id.
pub async fn get_payout_by_id<C>(db: &C, payout_id: i64) -> Result<Option<affiliate_payout::Model>>
where
    C: ConnectionTrait,
{
    AffiliatePayout::find_by_id(payout_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists an affiliate's payouts, newest first.
pub async fn list_payouts(
    db: &DatabaseConnection,
    affiliate_program_id: i64,
) -> Result<Vec<affiliate_payout::Model>> {
    AffiliatePayout::find()
        .filter(affiliate_payout::Column::AffiliateProgramId.eq(affiliate_program_id))
        .order_by_desc(affiliate_payout::Column::CreatedAt)
        .order_by_desc(affiliate_payout::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a payout to `new_status` and applies the matching earnings effect.
///
/// On completion the transaction id is stored and `paid_at` defaults to now. The payout
/// row and the affiliate's earnings are updated in one transaction.
pub async fn transition_payout(
    db: &DatabaseConnection,
    payout_id: i64,
    new_status: PayoutStatus,
    transaction_id: Option<String>,
    paid_at: Option<DateTime<Utc>>,
) -> Result<PayoutTransition> {
    let txn = db.begin().await?;

    let payout = get_payout_by_id(&txn, payout_id)
        .await?
        .ok_or(Error::PayoutNotFound { id: payout_id })?;
    let current: PayoutStatus = payout.status.parse()?;
    let effect = transition_effect(current, new_status)?;

    let affiliate_program_id = payout.affiliate_program_id;
    let amount = payout.amount;

    let mut update = AffiliatePayout::update_many().col_expr(
        affiliate_payout::Column::Status,
        Expr::value(new_status.as_str()),
    );
    if effect == PayoutEffect::Settle {
        update = update
            .col_expr(
                affiliate_payout::Column::TransactionId,
                Expr::value(transaction_id),
            )
            .col_expr(
                affiliate_payout::Column::PaidAt,
                Expr::value(Some(paid_at.unwrap_or_else(Utc::now))),
            );
    }
    // Only applies while the payout still has the status read above
    let result = update
        .filter(affiliate_payout::Column::Id.eq(payout_id))
        .filter(affiliate_payout::Column::Status.eq(current.as_str()))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::InvalidPayoutTransition {
            from: current.to_string(),
            to: new_status.to_string(),
        });
    }
    let payout = get_payout_by_id(&txn, payout_id)
        .await?
        .ok_or(Error::PayoutNotFound { id: payout_id })?;

    let program = match effect {
        PayoutEffect::Settle => ledger::settle_payout(&txn, affiliate_program_id, amount).await?,
        PayoutEffect::Restore => {
            ledger::restore_failed_payout(&txn, affiliate_program_id, amount).await?
        }
    };

    txn.commit().await?;

    info!(
        "Payout {} moved {} -> {} (${:.2}, program {})",
        payout_id, current, new_status, amount, affiliate_program_id
    );
    Ok(PayoutTransition { payout, program })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[test]
    fn test_transition_table_is_closed() {
        use PayoutStatus::{Completed, Failed, Pending};
        for from in PayoutStatus::ALL {
            for to in PayoutStatus::ALL {
                let result = transition_effect(from, to);
                match (from, to) {
                    (Pending, Completed) => assert_eq!(result.unwrap(), PayoutEffect::Settle),
                    (Pending, Failed) => assert_eq!(result.unwrap(), PayoutEffect::Restore),
                    _ => assert!(matches!(
                        result,
                        Err(Error::InvalidPayoutTransition { .. })
                    )),
                }
            }
        }
    }

    #[test]
    fn test_payout_status_parse() {
        assert_eq!(
            "completed".parse::<PayoutStatus>().unwrap(),
            PayoutStatus::Completed
        );
        assert_eq!(" FAILED ".parse::<PayoutStatus>().unwrap(), PayoutStatus::Failed);
        assert!("paid".parse::<PayoutStatus>().is_err());
    }

    #[tokio::test]
    async fn test_complete_payout_settles_earnings() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_earnings(&db, program.id, 500.0, 500.0, 0.0).await?;
        let payout = create_payout(&db, program.id, 500.0, "usdt".to_string(), None).await?;
        assert_eq!(payout.status, "PENDING");

        let done = transition_payout(
            &db,
            payout.id,
            PayoutStatus::Completed,
            Some("tx-123".to_string()),
            None,
        )
        .await?;

        assert_eq!(done.payout.status, "COMPLETED");
        assert_eq!(done.payout.transaction_id.as_deref(), Some("tx-123"));
        assert!(done.payout.paid_at.is_some());
        assert_eq!(done.program.pending_earnings, 0.0);
        assert_eq!(done.program.paid_earnings, 500.0);
        assert_eq!(done.program.total_earnings, 500.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_complete_payout_clamps_pending() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_earnings(&db, program.id, 300.0, 300.0, 0.0).await?;
        let payout = create_payout(&db, program.id, 500.0, "bank".to_string(), None).await?;

        let done =
            transition_payout(&db, payout.id, PayoutStatus::Completed, None, None).await?;
        assert_eq!(done.program.pending_earnings, 0.0);
        assert_eq!(done.program.paid_earnings, 500.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_fail_payout_restores_pending() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_earnings(&db, program.id, 200.0, 0.0, 0.0).await?;
        let payout = create_payout(&db, program.id, 200.0, "bank".to_string(), None).await?;

        let failed =
            transition_payout(&db, payout.id, PayoutStatus::Failed, None, None).await?;
        assert_eq!(failed.payout.status, "FAILED");
        assert!(failed.payout.paid_at.is_none());
        assert_eq!(failed.program.pending_earnings, 200.0);
        assert_eq!(failed.program.paid_earnings, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_undefined_transitions_change_nothing() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        set_earnings(&db, program.id, 500.0, 500.0, 0.0).await?;
        let payout = create_payout(&db, program.id, 500.0, "usdt".to_string(), None).await?;
        transition_payout(&db, payout.id, PayoutStatus::Completed, None, None).await?;

        for target in PayoutStatus::ALL {
            let result = transition_payout(&db, payout.id, target, None, None).await;
            assert!(matches!(
                result,
                Err(Error::InvalidPayoutTransition { .. })
            ));
        }

        let program = affiliate::get_program_by_id(&db, program.id).await?;
        assert_eq!(program.pending_earnings, 0.0);
        assert_eq!(program.paid_earnings, 500.0);
        let payout = get_payout_by_id(&db, payout.id).await?.unwrap();
        assert_eq!(payout.status, "COMPLETED");
        Ok(())
    }

    #[tokio::test]
    async fn test_transition_unknown_payout() -> Result<()> {
        let db = setup_test_db().await?;
        let result = transition_payout(&db, 31, PayoutStatus::Completed, None, None).await;
        assert!(matches!(result, Err(Error::PayoutNotFound { id: 31 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_payout_validation() -> Result<()> {
        let (db, program) = setup_with_affiliate().await?;
        assert!(matches!(
            create_payout(&db, program.id, 0.0, "usdt".to_string(), None).await,
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            create_payout(&db, program.id, 10.0, " ".to_string(), None).await,
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            create_payout(&db, 999, 10.0, "usdt".to_string(), None).await,
            Err(Error::AffiliateNotFound { .. })
        ));

        // Creation alone does not move earnings
        create_payout(&db, program.id, 10.0, "usdt".to_string(), Some("march".to_string()))
            .await?;
        let program = affiliate::get_program_by_id(&db, program.id).await?;
        assert_eq!(program.pending_earnings, 0.0);
        assert_eq!(list_payouts(&db, program.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_earnings_write_rolls_back_transition() -> Result<()> {
        let now = Utc::now();
        let pending = affiliate_payout::Model {
            id: 3,
            affiliate_program_id: 1,
            amount: 250.0,
            method: "usdt".to_string(),
            status: "PENDING".to_string(),
            transaction_id: None,
            notes: None,
            paid_at: None,
            created_at: now,
        };
        let failed = affiliate_payout::Model {
            status: "FAILED".to_string(),
            ..pending.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results(vec![vec![pending], vec![failed]])
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_exec_errors(vec![DbErr::Custom("disk I/O error".to_string())])
            .into_connection();

        let result = transition_payout(&db, 3, PayoutStatus::Failed, None, None).await;
        assert!(matches!(result, Err(Error::Database(_))));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains("UPDATE"));
        assert!(!log.contains("COMMIT"));
        Ok(())
    }
}
