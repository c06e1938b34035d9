use crate::{
    config::LedgerConfig,
    error::{ApiError, Result},
};
use sea_orm::{
    entity::*, query::*, sea_query::OnConflict, ConnectionTrait, DatabaseConnection, DbErr,
    TransactionTrait,
};
use std::future::Future;
use tracing::{info, instrument};
use uuid::Uuid;

/// A payload that knows how to shrink itself to a given number of affordable
/// units (the same units the caller derived its cost in). Text payloads
/// truncate by character count; fixed-fee operations pass `()`.
pub trait Truncatable {
    fn truncate_to(self, units: i32) -> Self;
}

impl Truncatable for String {
    fn truncate_to(self, units: i32) -> Self {
        self.chars().take(units.max(0) as usize).collect()
    }
}

impl Truncatable for () {
    fn truncate_to(self, _units: i32) -> Self {
        self
    }
}

/// Result of a successful deduction. Partial fulfillment is a success:
/// `charged < requested` with `truncated == true` and the payload cut down
/// to what the balance covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduction<P> {
    pub charged: i32,
    pub truncated: bool,
    pub balance_after: i32,
    pub payload: P,
}

/// Read-only affordability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditCheck {
    pub balance: i32,
    pub can_make_request: bool,
}

#[derive(Debug, Clone, Copy)]
struct AppliedDeduction {
    charged: i32,
    balance_after: i32,
}

/// Sole owner of `accounts.total_credit`. Every balance mutation goes through
/// `deduct` or `credit`; both run as a transaction holding a row lock on the
/// account, so operations on one account serialize while different accounts
/// proceed independently.
#[derive(Clone)]
pub struct LedgerService {
    db: DatabaseConnection,
    config: LedgerConfig,
}

impl LedgerService {
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            config: config.clone(),
        }
    }

    pub fn signup_grant(&self) -> i32 {
        self.config.signup_grant
    }

    pub fn transcription_fee(&self) -> i32 {
        self.config.transcription_fee
    }

    pub fn poll_fee(&self) -> i32 {
        self.config.poll_fee
    }

    /// Check the current balance without side effects.
    #[instrument(skip(self))]
    pub async fn can_spend(&self, user_id: &str) -> Result<CreditCheck> {
        let account = self
            .with_retry(|| async {
                entity::accounts::Entity::find()
                    .filter(entity::accounts::Column::UserId.eq(user_id))
                    .one(&self.db)
                    .await
                    .map_err(ApiError::from)
            })
            .await?
            .ok_or_else(|| ApiError::AccountNotFound(user_id.to_string()))?;

        Ok(CreditCheck {
            balance: account.total_credit,
            can_make_request: account.total_credit > 0,
        })
    }

    /// Atomically deduct up to `requested_cost` from the account.
    ///
    /// A balance of exactly 0 is a hard stop (`NoCreditsAvailable`). A
    /// positive balance smaller than the cost charges the whole remainder and
    /// truncates the payload to the units actually paid for.
    #[instrument(skip(self, payload))]
    pub async fn deduct<P>(&self, user_id: &str, requested_cost: i32, payload: P) -> Result<Deduction<P>>
    where
        P: Truncatable,
    {
        if requested_cost < 0 {
            return Err(ApiError::BadRequest(
                "Requested cost must be non-negative".to_string(),
            ));
        }

        let applied = self
            .with_retry(|| self.apply_deduction(user_id, requested_cost))
            .await?;

        let truncated = applied.charged < requested_cost;
        let payload = if truncated {
            payload.truncate_to(applied.charged)
        } else {
            payload
        };

        info!(
            "Deducted {} of {} requested credits for user {} (remaining: {})",
            applied.charged, requested_cost, user_id, applied.balance_after
        );

        Ok(Deduction {
            charged: applied.charged,
            truncated,
            balance_after: applied.balance_after,
            payload,
        })
    }

    /// Credit a verified top-up. Creates the account (signup grant + amount)
    /// on first payment; otherwise increments under the same row lock that
    /// `deduct` takes, so a top-up racing a deduction can never lose an
    /// update. Returns the new balance.
    #[instrument(skip(self))]
    pub async fn credit(&self, user_id: &str, amount: i32) -> Result<i32> {
        if amount < 0 {
            return Err(ApiError::BadRequest(
                "Credit amount must be non-negative".to_string(),
            ));
        }

        let new_balance = self
            .with_retry(|| self.apply_credit(user_id, amount))
            .await?;

        info!(
            "Credited {} to user {} (new balance: {})",
            amount, user_id, new_balance
        );

        Ok(new_balance)
    }

    /// Create the account with the signup grant if it does not exist.
    /// Safe to call on every authenticated visit; concurrent calls create
    /// exactly one row.
    #[instrument(skip(self))]
    pub async fn ensure_account(&self, user_id: &str) -> Result<entity::accounts::Model> {
        self.with_retry(|| async {
            insert_account_if_absent(&self.db, user_id, self.config.signup_grant).await?;

            entity::accounts::Entity::find()
                .filter(entity::accounts::Column::UserId.eq(user_id))
                .one(&self.db)
                .await?
                .ok_or_else(|| {
                    ApiError::Internal(anyhow::anyhow!(
                        "Failed to find account record after upsert for user {}",
                        user_id
                    ))
                })
        })
        .await
    }

    /// Single attempt of the deduct transaction: lock, check, decrement.
    async fn apply_deduction(&self, user_id: &str, requested_cost: i32) -> Result<AppliedDeduction> {
        let txn = self.db.begin().await?;

        let account = entity::accounts::Entity::find()
            .filter(entity::accounts::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::AccountNotFound(user_id.to_string()))?;

        let balance = account.total_credit;
        if balance == 0 {
            txn.rollback().await?;
            return Err(ApiError::NoCreditsAvailable);
        }

        // Cap the charge at the current balance; never below zero
        let charged = requested_cost.min(balance);
        let balance_after = balance - charged;

        let mut account_active: entity::accounts::ActiveModel = account.into();
        account_active.total_credit = Set(balance_after);
        account_active.updated_at = Set(time::OffsetDateTime::now_utc());
        account_active.update(&txn).await?;

        txn.commit().await?;

        Ok(AppliedDeduction {
            charged,
            balance_after,
        })
    }

    /// Single attempt of the credit transaction.
    async fn apply_credit(&self, user_id: &str, amount: i32) -> Result<i32> {
        let txn = self.db.begin().await?;

        // First payment may arrive before the first visit; create the row
        // with the signup grant, then apply the amount under the lock. If two
        // first payments race, the unique index makes one insert a no-op and
        // both increments land on the same row.
        insert_account_if_absent(&txn, user_id, self.config.signup_grant).await?;

        let account = entity::accounts::Entity::find()
            .filter(entity::accounts::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!(
                    "Failed to create or lock account record for user {}",
                    user_id
                ))
            })?;

        let Some(new_balance) = account.total_credit.checked_add(amount) else {
            txn.rollback().await?;
            return Err(ApiError::BadRequest(
                "Credit amount overflows the balance".to_string(),
            ));
        };

        let mut account_active: entity::accounts::ActiveModel = account.into();
        account_active.total_credit = Set(new_balance);
        account_active.updated_at = Set(time::OffsetDateTime::now_utc());
        account_active.update(&txn).await?;

        txn.commit().await?;

        Ok(new_balance)
    }

    /// Retry transient storage failures a bounded number of times with linear
    /// backoff, then surface them as `StorageUnavailable`. Contract errors
    /// (`AccountNotFound`, `NoCreditsAvailable`) pass through untouched.
    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts: u8 = 0;
        loop {
            match op().await {
                Err(ApiError::Database(e)) if is_transient(&e) => {
                    attempts += 1;
                    if attempts > self.config.storage_retry_attempts {
                        return Err(ApiError::StorageUnavailable(e));
                    }
                    tracing::warn!(
                        "Transient storage error (attempt {}): {:?}",
                        attempts,
                        e
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(100 * attempts as u64))
                        .await;
                }
                other => return other,
            }
        }
    }
}

/// Insert the account row with the signup grant, tolerating a concurrent
/// insert of the same user_id.
async fn insert_account_if_absent<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    signup_grant: i32,
) -> Result<()> {
    let now = time::OffsetDateTime::now_utc();
    let new_account = entity::accounts::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id.to_string()),
        total_credit: Set(signup_grant),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let insert_result = entity::accounts::Entity::insert(new_account)
        .on_conflict(
            OnConflict::column(entity::accounts::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec(conn)
        .await;

    match insert_result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}
