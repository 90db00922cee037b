use chrono::Duration;
use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, money::require_in_range};

mod access;
mod allocations;
mod auth;
mod budgets;
mod cards;
mod categories;
mod incomes;
mod pockets;
mod savings;
mod transactions;
mod users;

pub use budgets::BudgetDetail;
pub use transactions::{CardPayment, TransactionListFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

const DEFAULT_SESSION_TTL_HOURS: i64 = 720;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    session_ttl: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn require_non_negative(amount_minor: i64, label: &str) -> ResultEngine<i64> {
    if amount_minor < 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be >= 0")));
    }
    require_in_range(amount_minor, label)
}

fn require_positive(amount_minor: i64, label: &str) -> ResultEngine<i64> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    require_in_range(amount_minor, label)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    session_ttl: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// How long a session stays valid after sign-in.
    pub fn session_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.session_ttl = ttl;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.session_ttl <= Duration::zero() {
            return Err(EngineError::InvalidValue(
                "session ttl must be positive".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            session_ttl: self.session_ttl,
        })
    }
}
