//! Redemption Ledger
//!
//! Durable record that a promotion was applied to an order. Redemptions are keyed by
//! `(tenant, promotion, order)`; recording the same key twice returns the first row
//! instead of failing, so retried checkouts are safe.

use std::sync::{Mutex, MutexGuard};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};

use crate::{
    ids::{OrderUuid, PromotionUuid, RedemptionUuid, TenantUuid, UserUuid},
    lookups::{LookupError, RedemptionCounts},
};

/// A recorded redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    /// Redemption identifier
    pub uuid: RedemptionUuid,

    /// Tenant
    pub tenant: TenantUuid,

    /// Promotion redeemed
    pub promotion: PromotionUuid,

    /// User, absent for guests
    pub user: Option<UserUuid>,

    /// Order the promotion was applied to
    pub order: OrderUuid,

    /// Discount granted
    pub amount: Money<'static, Currency>,

    /// When the redemption was recorded
    pub created_at: Timestamp,
}

/// Request to record a redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRedemption {
    /// Promotion redeemed
    pub promotion: PromotionUuid,

    /// Order the promotion was applied to
    pub order: OrderUuid,

    /// User, absent for guests
    pub user: Option<UserUuid>,

    /// Discount granted
    pub amount: Money<'static, Currency>,
}

/// Result of [`RedemptionLedger::redeem`].
#[derive(Debug, Clone, PartialEq)]
pub enum RedemptionOutcome {
    /// A new row was written.
    Recorded(Redemption),

    /// The order already redeemed this promotion; the stored row is returned unchanged.
    Duplicate(Redemption),
}

impl RedemptionOutcome {
    /// The stored redemption, new or existing.
    #[must_use]
    pub fn redemption(&self) -> &Redemption {
        match self {
            RedemptionOutcome::Recorded(redemption) | RedemptionOutcome::Duplicate(redemption) => {
                redemption
            }
        }
    }

    /// Consume into the stored redemption.
    #[must_use]
    pub fn into_redemption(self) -> Redemption {
        match self {
            RedemptionOutcome::Recorded(redemption) | RedemptionOutcome::Duplicate(redemption) => {
                redemption
            }
        }
    }

    /// Whether the call found an existing row.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RedemptionOutcome::Duplicate(_))
    }
}

/// Store of redemptions for one tenant.
///
/// Usage limits are checked when promotions are matched, not when redeeming, so
/// concurrent checkouts may both pass a limit check and both redeem.
pub trait RedemptionLedger: RedemptionCounts {
    /// Record a redemption, or return the existing one for the same promotion and order.
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] when the ledger cannot be written or read.
    fn redeem(
        &self,
        redemption: NewRedemption,
        now: Timestamp,
    ) -> Result<RedemptionOutcome, LookupError>;
}

type LedgerRows = FxHashMap<(PromotionUuid, OrderUuid), Redemption>;

/// In-memory ledger for a single tenant.
#[derive(Debug)]
pub struct InMemoryLedger {
    tenant: TenantUuid,
    rows: Mutex<LedgerRows>,
}

impl InMemoryLedger {
    /// Create an empty ledger for `tenant`.
    #[must_use]
    pub fn new(tenant: TenantUuid) -> Self {
        Self {
            tenant,
            rows: Mutex::new(FxHashMap::default()),
        }
    }

    /// Tenant this ledger belongs to.
    #[must_use]
    pub fn tenant(&self) -> TenantUuid {
        self.tenant
    }

    /// Number of stored rows.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Unavailable`] when the ledger lock is poisoned.
    pub fn row_count(&self) -> Result<usize, LookupError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerRows>, LookupError> {
        self.rows.lock().map_err(|_poisoned| {
            LookupError::Unavailable("redemption ledger lock poisoned".to_string())
        })
    }
}

impl RedemptionCounts for InMemoryLedger {
    fn count_redemptions(&self, promotion: PromotionUuid) -> Result<u64, LookupError> {
        let rows = self.lock()?;

        let count = rows.keys().filter(|(id, _)| *id == promotion).count();

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    fn count_user_redemptions(
        &self,
        promotion: PromotionUuid,
        user: UserUuid,
    ) -> Result<u64, LookupError> {
        let rows = self.lock()?;

        let count = rows
            .values()
            .filter(|row| row.promotion == promotion && row.user == Some(user))
            .count();

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

impl RedemptionLedger for InMemoryLedger {
    fn redeem(
        &self,
        redemption: NewRedemption,
        now: Timestamp,
    ) -> Result<RedemptionOutcome, LookupError> {
        let mut rows = self.lock()?;
        let key = (redemption.promotion, redemption.order);

        if let Some(existing) = rows.get(&key) {
            return Ok(RedemptionOutcome::Duplicate(existing.clone()));
        }

        let row = Redemption {
            uuid: RedemptionUuid::new(),
            tenant: self.tenant,
            promotion: redemption.promotion,
            user: redemption.user,
            order: redemption.order,
            amount: redemption.amount,
            created_at: now,
        };

        rows.insert(key, row.clone());

        Ok(RedemptionOutcome::Recorded(row))
    }
}
