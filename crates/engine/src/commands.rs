//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists. In update structs `None` leaves
//! a field untouched; a nested `Some(None)` clears an optional field.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{BudgetStrategy, CardType, Frequency, TransactionType};

/// Open a new account with its first user.
#[derive(Clone, Debug)]
pub struct SignUpCmd {
    pub account_name: Option<String>,
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Add a user to the caller's account.
#[derive(Clone, Debug)]
pub struct NewUserCmd {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Clone, Debug, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A category referenced by id or by name. Names are matched on their
/// normalized key and created when missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryRef {
    Id(Uuid),
    Name(String),
}

#[derive(Clone, Debug)]
pub struct IncomeDraft {
    pub source: String,
    pub amount_minor: i64,
    pub frequency: Frequency,
    pub is_planned: bool,
}

#[derive(Clone, Debug, Default)]
pub struct IncomeUpdate {
    pub source: Option<String>,
    pub amount_minor: Option<i64>,
    pub frequency: Option<Frequency>,
    pub is_planned: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct AllocationLine {
    pub category: CategoryRef,
    pub allocated_minor: i64,
}

/// Everything the budget setup flow collects, submitted at once.
#[derive(Clone, Debug)]
pub struct BudgetDraft {
    pub name: String,
    pub period: Frequency,
    pub strategy: BudgetStrategy,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub incomes: Vec<IncomeDraft>,
    pub categories: Vec<AllocationLine>,
}

impl BudgetDraft {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        period: Frequency,
        strategy: BudgetStrategy,
        start_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            period,
            strategy,
            start_at,
            end_at: None,
            incomes: Vec::new(),
            categories: Vec::new(),
        }
    }

    #[must_use]
    pub fn end_at(mut self, end_at: DateTime<Utc>) -> Self {
        self.end_at = Some(end_at);
        self
    }

    #[must_use]
    pub fn income(
        mut self,
        source: impl Into<String>,
        amount_minor: i64,
        frequency: Frequency,
    ) -> Self {
        self.incomes.push(IncomeDraft {
            source: source.into(),
            amount_minor,
            frequency,
            is_planned: true,
        });
        self
    }

    #[must_use]
    pub fn category(mut self, category: CategoryRef, allocated_minor: i64) -> Self {
        self.categories.push(AllocationLine {
            category,
            allocated_minor,
        });
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct BudgetUpdate {
    pub name: Option<String>,
    pub period: Option<Frequency>,
    pub strategy: Option<BudgetStrategy>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<Option<String>>,
}

#[derive(Clone, Debug)]
pub struct CardCmd {
    pub name: String,
    pub card_type: CardType,
    pub last_four: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CardUpdate {
    pub name: Option<String>,
    pub card_type: Option<CardType>,
    pub last_four: Option<Option<String>>,
}

/// Record a transaction.
#[derive(Clone, Debug)]
pub struct TransactionCmd {
    pub amount_minor: i64,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub category_id: Option<Uuid>,
    pub card_id: Option<Uuid>,
}

impl TransactionCmd {
    #[must_use]
    pub fn new(
        amount_minor: i64,
        transaction_type: TransactionType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            amount_minor,
            transaction_type,
            description: None,
            occurred_at,
            category_id: None,
            card_id: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn card_id(mut self, card_id: Uuid) -> Self {
        self.card_id = Some(card_id);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct TransactionUpdate {
    pub amount_minor: Option<i64>,
    pub transaction_type: Option<TransactionType>,
    pub description: Option<Option<String>>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub category_id: Option<Option<Uuid>>,
    pub card_id: Option<Option<Uuid>>,
}

/// Move money from one card to another.
#[derive(Clone, Debug)]
pub struct CardPaymentCmd {
    pub from_card_id: Uuid,
    pub to_card_id: Uuid,
    pub amount_minor: i64,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PocketCmd {
    pub name: String,
    pub goal_minor: Option<i64>,
    pub goal_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct PocketUpdate {
    pub name: Option<String>,
    pub goal_minor: Option<Option<i64>>,
    pub goal_at: Option<Option<DateTime<Utc>>>,
}

/// Deposit into (or withdraw from) a pocket.
///
/// A negative `amount_minor` is read as a withdrawal of its absolute value.
#[derive(Clone, Debug)]
pub struct AllocationCmd {
    pub amount_minor: i64,
    pub withdrawal: bool,
    pub note: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default)]
pub struct AllocationUpdate {
    pub amount_minor: Option<i64>,
    pub withdrawal: Option<bool>,
    pub note: Option<Option<String>>,
    pub occurred_at: Option<DateTime<Utc>>,
}
