use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Deserializer for PATCH fields that can be cleared.
///
/// Use with `#[serde(default, deserialize_with = "clearable")]`:
/// a missing key stays `None`, `null` becomes `Some(None)`.
pub fn clearable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Shared by income recurrence and budget period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    OneTime,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct SignUp {
        #[validate(length(min = 1, max = 100, message = "account name must be 1-100 characters"))]
        pub account_name: Option<String>,
        #[validate(email(message = "invalid email address"))]
        pub email: String,
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
        #[validate(length(min = 8, message = "password must be at least 8 characters"))]
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct SignIn {
        #[validate(email(message = "invalid email address"))]
        pub email: String,
        #[validate(length(min = 1, message = "password is required"))]
        pub password: String,
    }

    /// New member of the caller's account.
    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct UserNew {
        #[validate(email(message = "invalid email address"))]
        pub email: String,
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
        #[validate(length(min = 8, message = "password must be at least 8 characters"))]
        pub password: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct UserUpdate {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: Option<String>,
        #[validate(email(message = "invalid email address"))]
        pub email: Option<String>,
        #[validate(length(min = 8, message = "password must be at least 8 characters"))]
        pub password: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub email: String,
        pub name: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsersResponse {
        pub users: Vec<UserView>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum BudgetStrategy {
        ZeroSum,
        Percentage,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct IncomeNew {
        #[validate(length(min = 1, max = 100, message = "source must be 1-100 characters"))]
        pub source: String,
        #[validate(range(
            min = 0,
            max = 10_000_000_000_000_i64,
            message = "amount must be between 0 and 10000000000000"
        ))]
        pub amount_minor: i64,
        pub frequency: Frequency,
        #[serde(default = "planned_default")]
        pub is_planned: bool,
    }

    fn planned_default() -> bool {
        true
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct IncomeUpdate {
        #[validate(length(min = 1, max = 100, message = "source must be 1-100 characters"))]
        pub source: Option<String>,
        #[validate(range(
            min = 0,
            max = 10_000_000_000_000_i64,
            message = "amount must be between 0 and 10000000000000"
        ))]
        pub amount_minor: Option<i64>,
        pub frequency: Option<Frequency>,
        pub is_planned: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeView {
        pub id: Uuid,
        pub budget_id: Uuid,
        pub source: String,
        pub amount_minor: i64,
        pub frequency: Frequency,
        pub is_planned: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomesResponse {
        pub incomes: Vec<IncomeView>,
    }

    /// One category line of a new budget.
    ///
    /// Exactly one of `category_id` (existing category) and `name` (looked
    /// up by name, created when missing) must be set.
    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct CategoryLine {
        pub category_id: Option<Uuid>,
        #[validate(length(min = 1, max = 100, message = "category name must be 1-100 characters"))]
        pub name: Option<String>,
        #[validate(range(
            min = 0,
            max = 10_000_000_000_000_i64,
            message = "allocation must be between 0 and 10000000000000"
        ))]
        pub allocated_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct BudgetNew {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
        pub period: Frequency,
        pub strategy: BudgetStrategy,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub start_at: DateTime<FixedOffset>,
        pub end_at: Option<DateTime<FixedOffset>>,
        #[serde(default)]
        #[validate(nested)]
        pub incomes: Vec<IncomeNew>,
        #[serde(default)]
        #[validate(nested)]
        pub categories: Vec<CategoryLine>,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct BudgetUpdate {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: Option<String>,
        pub period: Option<Frequency>,
        pub strategy: Option<BudgetStrategy>,
        pub start_at: Option<DateTime<FixedOffset>>,
        /// `null` removes the end of the budget window.
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub end_at: Option<Option<DateTime<FixedOffset>>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub id: Uuid,
        pub name: String,
        pub period: Frequency,
        pub strategy: BudgetStrategy,
        pub start_at: DateTime<Utc>,
        pub end_at: Option<DateTime<Utc>>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetsResponse {
        pub budgets: Vec<BudgetView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetCategoryView {
        pub id: Uuid,
        pub budget_id: Uuid,
        pub category_id: Uuid,
        pub name: String,
        pub allocated_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetDetailView {
        pub budget: BudgetView,
        pub incomes: Vec<IncomeView>,
        pub categories: Vec<BudgetCategoryView>,
    }

    /// Body of `PUT /budgets/{id}/categories/{category_id}`.
    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct Allocate {
        #[validate(range(
            min = 0,
            max = 10_000_000_000_000_i64,
            message = "allocation must be between 0 and 10000000000000"
        ))]
        pub allocated_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorySummaryView {
        pub category_id: Uuid,
        pub name: String,
        pub allocated_minor: i64,
        pub spent_minor: i64,
        pub remaining_minor: i64,
        pub completed: bool,
        pub over_budget_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetSummaryView {
        pub budget_id: Uuid,
        /// Plain sum of income amounts.
        pub total_income_minor: i64,
        /// Incomes scaled to one budget period.
        pub normalized_income_minor: i64,
        pub total_allocated_minor: i64,
        pub remaining_minor: i64,
        /// Only reported for zero-sum budgets.
        pub balanced: Option<bool>,
        pub categories: Vec<CategorySummaryView>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct CategoryNew {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
        #[validate(length(max = 50, message = "icon must be at most 50 characters"))]
        pub icon: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct CategoryUpdate {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: Option<String>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub icon: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub icon: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod card {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum CardType {
        Debit,
        Credit,
        Cash,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct CardNew {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
        pub card_type: CardType,
        #[validate(length(equal = 4, message = "last_four must be 4 digits"))]
        pub last_four: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct CardUpdate {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: Option<String>,
        pub card_type: Option<CardType>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub last_four: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardView {
        pub id: Uuid,
        pub name: String,
        pub card_type: CardType,
        pub last_four: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardsResponse {
        pub cards: Vec<CardView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum TransactionType {
        Regular,
        Return,
        Income,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct TransactionNew {
        /// Must be > 0. The type decides how it counts against a category.
        #[validate(range(
            min = 1,
            max = 10_000_000_000_000_i64,
            message = "amount must be between 1 and 10000000000000"
        ))]
        pub amount_minor: i64,
        pub transaction_type: TransactionType,
        #[validate(length(max = 500, message = "description must be at most 500 characters"))]
        pub description: Option<String>,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
        pub category_id: Option<Uuid>,
        pub card_id: Option<Uuid>,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct TransactionUpdate {
        #[validate(range(
            min = 1,
            max = 10_000_000_000_000_i64,
            message = "amount must be between 1 and 10000000000000"
        ))]
        pub amount_minor: Option<i64>,
        pub transaction_type: Option<TransactionType>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub description: Option<Option<String>>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub category_id: Option<Option<Uuid>>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub card_id: Option<Option<Uuid>>,
    }

    /// Body of `POST /transactions/{id}/copy`. The copy happens now unless
    /// `occurred_at` is given.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionCopy {
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    /// Query string of `GET /transactions`.
    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct TransactionList {
        pub category_id: Option<Uuid>,
        pub card_id: Option<Uuid>,
        pub transaction_type: Option<TransactionType>,
        /// Inclusive lower bound.
        pub from: Option<DateTime<FixedOffset>>,
        /// Exclusive upper bound.
        pub to: Option<DateTime<FixedOffset>>,
        #[validate(range(min = 1, max = 200, message = "limit must be between 1 and 200"))]
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub amount_minor: i64,
        pub transaction_type: TransactionType,
        pub description: Option<String>,
        pub occurred_at: DateTime<Utc>,
        pub category_id: Option<Uuid>,
        pub card_id: Option<Uuid>,
        pub card_payment_id: Option<Uuid>,
        pub created_by: Uuid,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct CardPaymentNew {
        pub from_card_id: Uuid,
        pub to_card_id: Uuid,
        #[validate(range(
            min = 1,
            max = 10_000_000_000_000_i64,
            message = "amount must be between 1 and 10000000000000"
        ))]
        pub amount_minor: i64,
        pub occurred_at: DateTime<FixedOffset>,
        #[validate(length(max = 500, message = "description must be at most 500 characters"))]
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CardPaymentView {
        pub card_payment_id: Uuid,
        /// Outgoing leg, negative amount.
        pub from: TransactionView,
        /// Incoming leg, positive amount.
        pub to: TransactionView,
    }
}

pub mod savings {
    use super::*;

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct SavingsNew {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct SavingsUpdate {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SavingsView {
        pub id: Uuid,
        pub name: String,
        pub total_minor: i64,
        pub pockets: Vec<PocketView>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SavingsListResponse {
        pub savings: Vec<SavingsView>,
    }

    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct PocketNew {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: String,
        #[validate(range(
            min = 1,
            max = 10_000_000_000_000_i64,
            message = "goal must be between 1 and 10000000000000"
        ))]
        pub goal_minor: Option<i64>,
        pub goal_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct PocketUpdate {
        #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
        pub name: Option<String>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub goal_minor: Option<Option<i64>>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub goal_at: Option<Option<DateTime<FixedOffset>>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PocketView {
        pub id: Uuid,
        pub savings_id: Uuid,
        pub name: String,
        pub goal_minor: Option<i64>,
        pub goal_at: Option<DateTime<Utc>>,
        pub total_minor: i64,
        /// Progress toward the goal, clamped to `[0, 100]`. Absent without a goal.
        pub goal_progress_percent: Option<f64>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PocketsResponse {
        pub pockets: Vec<PocketView>,
    }

    /// Deposit or withdrawal. A negative amount is read as a withdrawal.
    #[derive(Debug, Serialize, Deserialize, Validate)]
    pub struct AllocationNew {
        #[validate(range(
            min = -10_000_000_000_000_i64,
            max = 10_000_000_000_000_i64,
            message = "amount must be between -10000000000000 and 10000000000000"
        ))]
        pub amount_minor: i64,
        #[serde(default)]
        pub withdrawal: bool,
        #[validate(length(max = 500, message = "note must be at most 500 characters"))]
        pub note: Option<String>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Validate)]
    pub struct AllocationUpdate {
        #[validate(range(
            min = -10_000_000_000_000_i64,
            max = 10_000_000_000_000_i64,
            message = "amount must be between -10000000000000 and 10000000000000"
        ))]
        pub amount_minor: Option<i64>,
        pub withdrawal: Option<bool>,
        #[serde(
            default,
            deserialize_with = "clearable",
            skip_serializing_if = "Option::is_none"
        )]
        pub note: Option<Option<String>>,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AllocationView {
        pub id: Uuid,
        pub pocket_id: Uuid,
        pub amount_minor: i64,
        pub withdrawal: bool,
        pub note: Option<String>,
        pub occurred_at: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AllocationsResponse {
        pub allocations: Vec<AllocationView>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clearable_distinguishes_null_from_missing() {
        let missing: category::CategoryUpdate = serde_json::from_str(r#"{"name":"Food"}"#).unwrap();
        assert_eq!(missing.icon, None);

        let cleared: category::CategoryUpdate = serde_json::from_str(r#"{"icon":null}"#).unwrap();
        assert_eq!(cleared.icon, Some(None));

        let set: category::CategoryUpdate = serde_json::from_str(r#"{"icon":"cart"}"#).unwrap();
        assert_eq!(set.icon, Some(Some("cart".to_string())));
    }

    #[test]
    fn enums_use_screaming_snake_case() {
        let json = serde_json::to_string(&Frequency::OneTime).unwrap();
        assert_eq!(json, r#""ONE_TIME""#);
        let strategy: budget::BudgetStrategy = serde_json::from_str(r#""ZERO_SUM""#).unwrap();
        assert_eq!(strategy, budget::BudgetStrategy::ZeroSum);
    }

    #[test]
    fn sign_up_rejects_short_password_and_bad_email() {
        let request = user::SignUp {
            account_name: None,
            email: "not-an-email".to_string(),
            name: "Alice".to_string(),
            password: "short".to_string(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn budget_validation_reaches_nested_lines() {
        let request: budget::BudgetNew = serde_json::from_str(
            r#"{
                "name": "March",
                "period": "MONTHLY",
                "strategy": "ZERO_SUM",
                "start_at": "2025-03-01T00:00:00+01:00",
                "incomes": [{"source": "Salary", "amount_minor": -5, "frequency": "WEEKLY"}]
            }"#,
        )
        .unwrap();
        assert!(request.incomes[0].is_planned);
        assert!(request.validate().is_err());
    }

    #[test]
    fn amounts_are_bounded_above() {
        let income: budget::IncomeNew = serde_json::from_str(
            r#"{"source": "Salary", "amount_minor": 9000000000000000000, "frequency": "WEEKLY"}"#,
        )
        .unwrap();
        assert!(income.validate().is_err());

        let deposit: savings::AllocationNew =
            serde_json::from_str(r#"{"amount_minor": 10000000000001}"#).unwrap();
        assert!(deposit.validate().is_err());

        let withdrawal: savings::AllocationNew =
            serde_json::from_str(r#"{"amount_minor": -30000}"#).unwrap();
        assert!(withdrawal.validate().is_ok());
    }
}
