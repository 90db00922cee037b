use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Actor, BudgetCategory, Category, CategoryRef, CategoryUpdate, EngineError, ResultEngine,
    budget_categories, categories,
    util::{normalize_display_name, normalize_name_key},
};

use super::{Engine, normalize_optional_text, require_non_negative, with_tx};

impl Engine {
    async fn find_category_by_key(
        &self,
        db: &DatabaseTransaction,
        actor: Actor,
        name_norm: &str,
    ) -> ResultEngine<Option<categories::Model>> {
        categories::Entity::find()
            .filter(categories::Column::AccountId.eq(actor.account_id))
            .filter(categories::Column::NameNorm.eq(name_norm))
            .filter(categories::Column::Deleted.is_null())
            .one(db)
            .await
            .map_err(Into::into)
    }

    async fn insert_category(
        &self,
        db: &DatabaseTransaction,
        actor: Actor,
        name: String,
        name_norm: String,
        icon: Option<String>,
    ) -> ResultEngine<categories::Model> {
        categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            account_id: ActiveValue::Set(actor.account_id),
            name: ActiveValue::Set(name),
            name_norm: ActiveValue::Set(name_norm),
            icon: ActiveValue::Set(icon),
            created_at: ActiveValue::Set(Utc::now()),
            deleted: ActiveValue::Set(None),
        }
        .insert(db)
        .await
        .map_err(Into::into)
    }

    /// Resolve a category reference, creating named categories on first use.
    pub(super) async fn resolve_category_ref(
        &self,
        db: &DatabaseTransaction,
        actor: Actor,
        category: &CategoryRef,
    ) -> ResultEngine<categories::Model> {
        match category {
            CategoryRef::Id(id) => self.reference_category(db, actor, *id).await,
            CategoryRef::Name(name) => {
                let display = normalize_display_name(name, "category")?;
                let name_norm = normalize_name_key(&display)?;
                if let Some(model) = self.find_category_by_key(db, actor, &name_norm).await? {
                    return Ok(model);
                }
                self.insert_category(db, actor, display, name_norm, None)
                    .await
            }
        }
    }

    /// Upsert the allocation of `category_id` in `budget_id` on an open
    /// transaction.
    pub(super) async fn upsert_budget_category(
        &self,
        db: &DatabaseTransaction,
        actor: Actor,
        budget_id: Uuid,
        category: &categories::Model,
        allocated_minor: i64,
    ) -> ResultEngine<BudgetCategory> {
        let existing = budget_categories::Entity::find()
            .filter(budget_categories::Column::BudgetId.eq(budget_id))
            .filter(budget_categories::Column::CategoryId.eq(category.id))
            .filter(budget_categories::Column::Deleted.is_null())
            .one(db)
            .await?;
        let model = match existing {
            Some(model) => {
                let mut active: budget_categories::ActiveModel = model.into();
                active.allocated_minor = ActiveValue::Set(allocated_minor);
                active.update(db).await?
            }
            None => {
                budget_categories::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    account_id: ActiveValue::Set(actor.account_id),
                    budget_id: ActiveValue::Set(budget_id),
                    category_id: ActiveValue::Set(category.id),
                    allocated_minor: ActiveValue::Set(allocated_minor),
                    created_at: ActiveValue::Set(Utc::now()),
                    deleted: ActiveValue::Set(None),
                }
                .insert(db)
                .await?
            }
        };
        Ok(BudgetCategory::from_models(model, category))
    }

    /// Live categories of the caller's account, sorted by name.
    pub async fn list_categories(&self, actor: Actor) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let models = categories::Entity::find()
                .filter(categories::Column::AccountId.eq(actor.account_id))
                .filter(categories::Column::Deleted.is_null())
                .order_by_asc(categories::Column::NameNorm)
                .all(&db_tx)
                .await?;
            Ok::<_, EngineError>(models.into_iter().map(Category::from).collect())
        })
    }

    /// Create a category. Names are unique per account once normalized.
    pub async fn create_category(
        &self,
        actor: Actor,
        name: &str,
        icon: Option<&str>,
    ) -> ResultEngine<Category> {
        let display = normalize_display_name(name, "category")?;
        let name_norm = normalize_name_key(&display)?;
        let icon = normalize_optional_text(icon);
        with_tx!(self, |db_tx| {
            if self
                .find_category_by_key(&db_tx, actor, &name_norm)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(display));
            }
            let model = self
                .insert_category(&db_tx, actor, display, name_norm, icon)
                .await?;
            Ok(Category::from(model))
        })
    }

    pub async fn update_category(
        &self,
        actor: Actor,
        category_id: Uuid,
        update: CategoryUpdate,
    ) -> ResultEngine<Category> {
        let name = update
            .name
            .as_deref()
            .map(|name| {
                let display = normalize_display_name(name, "category")?;
                let name_norm = normalize_name_key(&display)?;
                Ok::<_, EngineError>((display, name_norm))
            })
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, actor, category_id).await?;
            let mut active: categories::ActiveModel = model.into();
            if let Some((display, name_norm)) = name {
                if let Some(other) = self.find_category_by_key(&db_tx, actor, &name_norm).await?
                    && other.id != category_id
                {
                    return Err(EngineError::ExistingKey(display));
                }
                active.name = ActiveValue::Set(display);
                active.name_norm = ActiveValue::Set(name_norm);
            }
            if let Some(icon) = update.icon {
                active.icon = ActiveValue::Set(normalize_optional_text(icon.as_deref()));
            }
            let model = active.update(&db_tx).await?;
            Ok(Category::from(model))
        })
    }

    /// Soft-delete a category together with its budget allocations.
    ///
    /// Transactions keep their category reference.
    pub async fn delete_category(&self, actor: Actor, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, actor, category_id).await?;
            let now = Utc::now();
            budget_categories::Entity::update_many()
                .col_expr(budget_categories::Column::Deleted, Expr::value(now))
                .filter(budget_categories::Column::CategoryId.eq(model.id))
                .filter(budget_categories::Column::Deleted.is_null())
                .exec(&db_tx)
                .await?;
            let mut active: categories::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(now));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }

    /// Set the amount allocated to a category in a budget, creating the
    /// allocation when missing.
    pub async fn allocate_category(
        &self,
        actor: Actor,
        budget_id: Uuid,
        category_id: Uuid,
        allocated_minor: i64,
    ) -> ResultEngine<BudgetCategory> {
        let allocated_minor = require_non_negative(allocated_minor, "allocated amount")?;
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, actor, budget_id).await?;
            let category = self.reference_category(&db_tx, actor, category_id).await?;
            self.upsert_budget_category(&db_tx, actor, budget_id, &category, allocated_minor)
                .await
        })
    }

    pub async fn remove_allocation(
        &self,
        actor: Actor,
        budget_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_budget(&db_tx, actor, budget_id).await?;
            let model = budget_categories::Entity::find()
                .filter(budget_categories::Column::BudgetId.eq(budget_id))
                .filter(budget_categories::Column::CategoryId.eq(category_id))
                .filter(budget_categories::Column::Deleted.is_null())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("budget category not exists".to_string()))?;
            let mut active: budget_categories::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }
}
