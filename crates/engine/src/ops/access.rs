use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    Actor, EngineError, ResultEngine, allocations, budgets, cards, categories, incomes, pockets,
    savings, transactions,
};

use super::Engine;

/// Generates a `require_*` lookup for an account-owned entity.
///
/// Rows of other accounts and soft-deleted rows are reported as missing.
macro_rules! impl_require_owned {
    ($require_fn:ident, $module:ident, $err_msg:literal) => {
        pub(super) async fn $require_fn(
            &self,
            db: &DatabaseTransaction,
            actor: Actor,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            $module::Entity::find_by_id(id)
                .filter($module::Column::AccountId.eq(actor.account_id))
                .filter($module::Column::Deleted.is_null())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

/// Generates a `reference_*` lookup for ids coming from a request payload.
///
/// Unlike `require_*`, a live row owned by another account is rejected with
/// `Forbidden`.
macro_rules! impl_reference_owned {
    ($reference_fn:ident, $module:ident, $label:literal) => {
        pub(super) async fn $reference_fn(
            &self,
            db: &DatabaseTransaction,
            actor: Actor,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            let model = $module::Entity::find_by_id(id)
                .filter($module::Column::Deleted.is_null())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(concat!($label, " not exists").to_string()))?;
            if model.account_id != actor.account_id {
                return Err(EngineError::Forbidden(
                    concat!($label, " belongs to another account").to_string(),
                ));
            }
            Ok(model)
        }
    };
}

impl Engine {
    impl_require_owned!(require_budget, budgets, "budget not exists");
    impl_require_owned!(require_income, incomes, "income not exists");
    impl_require_owned!(require_category, categories, "category not exists");
    impl_require_owned!(require_card, cards, "card not exists");
    impl_require_owned!(require_transaction, transactions, "transaction not exists");
    impl_require_owned!(require_savings, savings, "savings not exists");
    impl_require_owned!(require_pocket, pockets, "pocket not exists");
    impl_require_owned!(require_allocation, allocations, "allocation not exists");

    impl_reference_owned!(reference_category, categories, "category");
    impl_reference_owned!(reference_card, cards, "card");

    /// Check the optional category and card a transaction payload points at.
    pub(super) async fn check_transaction_refs(
        &self,
        db: &DatabaseTransaction,
        actor: Actor,
        category_id: Option<Uuid>,
        card_id: Option<Uuid>,
    ) -> ResultEngine<()> {
        if let Some(category_id) = category_id {
            self.reference_category(db, actor, category_id).await?;
        }
        if let Some(card_id) = card_id {
            self.reference_card(db, actor, card_id).await?;
        }
        Ok(())
    }
}
