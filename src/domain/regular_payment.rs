//! Recurring ("regular") payment templates.
//!
//! A [`RegularPayment`] describes a charge that repeats every month on the
//! day of [`RegularPayment::date_of_charge`]. It is materialized into an
//! [`Expense`](super::Expense) by the job execution endpoint or the monthly
//! sweep.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, CustomerId, NewExpense, RegularPaymentId};
use crate::error::GatewayError;

/// A stored recurring payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RegularPayment {
    /// Server-generated identifier.
    pub id: RegularPaymentId,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Amount charged every month. Never negative.
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// Reference date; its day of month is the monthly charge day.
    pub date_of_charge: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RegularPayment {
    /// Day of month (1-31) on which this payment is charged.
    #[must_use]
    pub fn charge_day(&self) -> u32 {
        self.date_of_charge.day()
    }

    /// Returns `true` if a monthly firing at `now` should materialize this
    /// payment.
    ///
    /// Charge days past the 28th are scheduled on every day from the 28th
    /// on. Only the firing on the charge day, or on the last day of a month
    /// too short to have it, is due.
    #[must_use]
    pub fn is_due_on(&self, now: DateTime<Utc>) -> bool {
        let charge_day = self.charge_day();
        if charge_day <= 28 {
            return true;
        }
        now.day() == charge_day.min(last_day_of_month(now.year(), now.month()))
    }

    /// Builds the expense this payment materializes into: same owner,
    /// amount and category, dated at [`Self::date_of_charge`].
    #[must_use]
    pub fn to_new_expense(&self) -> NewExpense {
        NewExpense {
            customer_id: self.customer_id,
            amount: self.amount,
            category: self.category,
            date: self.date_of_charge,
        }
    }
}

/// Caller-supplied fields of a new recurring payment, before the owner is
/// resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegularPaymentDraft {
    /// Monthly amount.
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// Charge reference date.
    pub date_of_charge: DateTime<Utc>,
}

impl RegularPaymentDraft {
    /// Validates the draft.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `amount` is negative.
    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_amount(self.amount)
    }

    /// Attaches the owning customer.
    #[must_use]
    pub const fn for_customer(self, customer_id: CustomerId) -> NewRegularPayment {
        NewRegularPayment {
            customer_id,
            amount: self.amount,
            category: self.category,
            date_of_charge: self.date_of_charge,
        }
    }
}

/// Insert payload for a new recurring payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegularPayment {
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Monthly amount.
    pub amount: Decimal,
    /// Spending category.
    pub category: Category,
    /// Charge reference date.
    pub date_of_charge: DateTime<Utc>,
}

impl NewRegularPayment {
    /// Validates the payload.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `amount` is negative.
    pub fn validate(&self) -> Result<(), GatewayError> {
        validate_amount(self.amount)
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegularPaymentPatch {
    /// New amount.
    pub amount: Option<Decimal>,
    /// New category.
    pub category: Option<Category>,
    /// New charge reference date.
    pub date_of_charge: Option<DateTime<Utc>>,
}

impl RegularPaymentPatch {
    /// Returns `true` if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.amount.is_none() && self.category.is_none() && self.date_of_charge.is_none()
    }

    /// Validates the patch.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the patch is empty or
    /// sets a negative amount.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "update must set at least one of amount, category, dateOfCharge".to_string(),
            ));
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        Ok(())
    }

    /// Patch that restores every mutable field of `payment`.
    #[must_use]
    pub fn restoring(payment: &RegularPayment) -> Self {
        Self {
            amount: Some(payment.amount),
            category: Some(payment.category),
            date_of_charge: Some(payment.date_of_charge),
        }
    }

    /// Applies the patch in place, bumping `updated_at`.
    pub fn apply_to(&self, payment: &mut RegularPayment) {
        if let Some(amount) = self.amount {
            payment.amount = amount;
        }
        if let Some(category) = self.category {
            payment.category = category;
        }
        if let Some(date_of_charge) = self.date_of_charge {
            payment.date_of_charge = date_of_charge;
        }
        payment.updated_at = Utc::now();
    }
}

/// Number of days in `month` of `year`.
#[must_use]
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}

fn validate_amount(amount: Decimal) -> Result<(), GatewayError> {
    if amount < Decimal::ZERO {
        return Err(GatewayError::InvalidRequest(
            "amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn payment() -> RegularPayment {
        let Some(date) = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).single() else {
            panic!("valid date");
        };
        RegularPayment {
            id: RegularPaymentId::new(),
            customer_id: CustomerId::new(),
            amount: Decimal::new(5000, 2),
            category: Category::Food,
            date_of_charge: date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn charge_day_is_day_of_month() {
        assert_eq!(payment().charge_day(), 15);
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        let Some(ts) = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single() else {
            panic!("valid date");
        };
        ts
    }

    #[test]
    fn month_lengths() {
        assert_eq!(last_day_of_month(2024, 2), 29);
        assert_eq!(last_day_of_month(2023, 2), 28);
        assert_eq!(last_day_of_month(2024, 4), 30);
        assert_eq!(last_day_of_month(2024, 12), 31);
    }

    #[test]
    fn end_of_month_payment_is_due_on_last_day() {
        let p = RegularPayment {
            date_of_charge: at(2024, 1, 31),
            ..payment()
        };
        assert!(p.is_due_on(at(2024, 2, 29)));
        assert!(!p.is_due_on(at(2024, 2, 28)));
        assert!(p.is_due_on(at(2023, 2, 28)));
        assert!(p.is_due_on(at(2024, 4, 30)));
        assert!(!p.is_due_on(at(2024, 4, 28)));
        assert!(!p.is_due_on(at(2024, 5, 30)));
        assert!(p.is_due_on(at(2024, 5, 31)));
    }

    #[test]
    fn early_charge_day_is_always_due() {
        assert!(payment().is_due_on(at(2024, 6, 15)));
        let p = RegularPayment {
            date_of_charge: at(2024, 1, 28),
            ..payment()
        };
        assert!(p.is_due_on(at(2024, 2, 28)));
    }

    #[test]
    fn new_expense_copies_template_fields() {
        let p = payment();
        let expense = p.to_new_expense();
        assert_eq!(expense.customer_id, p.customer_id);
        assert_eq!(expense.amount, p.amount);
        assert_eq!(expense.category, p.category);
        assert_eq!(expense.date, p.date_of_charge);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let p = payment();
        let new = NewRegularPayment {
            customer_id: p.customer_id,
            amount: Decimal::new(-1, 0),
            category: p.category,
            date_of_charge: p.date_of_charge,
        };
        assert!(new.validate().is_err());

        let zero = NewRegularPayment {
            amount: Decimal::ZERO,
            ..new
        };
        assert!(zero.validate().is_ok());
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(RegularPaymentPatch::default().validate().is_err());
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut p = payment();
        let before = p.clone();
        let patch = RegularPaymentPatch {
            category: Some(Category::Housing),
            ..RegularPaymentPatch::default()
        };
        patch.apply_to(&mut p);
        assert_eq!(p.category, Category::Housing);
        assert_eq!(p.amount, before.amount);
        assert_eq!(p.date_of_charge, before.date_of_charge);
    }

    #[test]
    fn restoring_patch_reverts_changes() {
        let original = payment();
        let mut p = original.clone();
        RegularPaymentPatch {
            amount: Some(Decimal::new(1, 0)),
            category: Some(Category::Other),
            date_of_charge: Some(Utc::now()),
        }
        .apply_to(&mut p);
        RegularPaymentPatch::restoring(&original).apply_to(&mut p);
        assert_eq!(p.amount, original.amount);
        assert_eq!(p.category, original.category);
        assert_eq!(p.date_of_charge, original.date_of_charge);
    }
}
