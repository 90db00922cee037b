//! Budgeting engine: domain types, the arithmetic core and the per-entity
//! service operations on top of a sea-orm database.
//!
//! Every owned row carries an `account_id`; every [`Engine`] operation takes
//! the calling [`Actor`] and only ever sees rows of its account.

pub use allocations::{Allocation, split_signed_amount};
pub use budget_categories::BudgetCategory;
pub use budgets::{Budget, BudgetStrategy};
pub use cards::{Card, CardType};
pub use categories::Category;
pub use commands::{
    AllocationCmd, AllocationLine, AllocationUpdate, BudgetDraft, BudgetUpdate, CardCmd,
    CardPaymentCmd, CardUpdate, CategoryRef, CategoryUpdate, IncomeDraft, IncomeUpdate,
    NewUserCmd, PocketCmd, PocketUpdate, SignUpCmd, TransactionCmd, TransactionUpdate, UserUpdate,
};
pub use error::EngineError;
pub use incomes::{Frequency, Income, normalize_income, normalized_income_total, raw_income_total};
pub use money::{MAX_AMOUNT_MINOR, MoneyCents};
pub use ops::{BudgetDetail, CardPayment, Engine, EngineBuilder, TransactionListFilter};
pub use pockets::{Pocket, goal_progress_percent, pocket_total};
pub use savings::{Savings, savings_total};
pub use sessions::Session;
pub use summary::{BudgetSummary, CategorySummary, summarize};
pub use transactions::{Transaction, TransactionType, card_payment_amounts, spent};
pub use users::{Actor, User};

mod accounts;
mod allocations;
mod budget_categories;
mod budgets;
mod cards;
mod categories;
mod commands;
mod error;
mod incomes;
mod money;
mod ops;
mod password;
mod pockets;
mod savings;
mod sessions;
mod summary;
mod transactions;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
