use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Actor, Allocation, EngineError, Pocket, ResultEngine, Savings, allocations, pockets, savings,
    util::normalize_display_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Live pockets of the given savings accounts, with their totals.
    pub(super) async fn load_pockets(
        &self,
        db: &DatabaseTransaction,
        savings_ids: Vec<Uuid>,
    ) -> ResultEngine<Vec<Pocket>> {
        let pocket_models = pockets::Entity::find()
            .filter(pockets::Column::SavingsId.is_in(savings_ids))
            .filter(pockets::Column::Deleted.is_null())
            .order_by_asc(pockets::Column::CreatedAt)
            .all(db)
            .await?;
        let pocket_ids: Vec<Uuid> = pocket_models.iter().map(|pocket| pocket.id).collect();

        let mut by_pocket: HashMap<Uuid, Vec<Allocation>> = HashMap::new();
        for model in allocations::Entity::find()
            .filter(allocations::Column::PocketId.is_in(pocket_ids))
            .filter(allocations::Column::Deleted.is_null())
            .all(db)
            .await?
        {
            by_pocket
                .entry(model.pocket_id)
                .or_default()
                .push(Allocation::from(model));
        }

        pocket_models
            .into_iter()
            .map(|model| {
                let allocations = by_pocket.remove(&model.id).unwrap_or_default();
                Pocket::from_model(model, &allocations)
            })
            .collect()
    }

    async fn savings_with_pockets(
        &self,
        db: &DatabaseTransaction,
        models: Vec<savings::Model>,
    ) -> ResultEngine<Vec<Savings>> {
        let ids = models.iter().map(|model| model.id).collect();
        let mut by_savings: HashMap<Uuid, Vec<Pocket>> = HashMap::new();
        for pocket in self.load_pockets(db, ids).await? {
            by_savings.entry(pocket.savings_id).or_default().push(pocket);
        }
        models
            .into_iter()
            .map(|model| {
                let pockets = by_savings.remove(&model.id).unwrap_or_default();
                Savings::from_model(model, pockets)
            })
            .collect()
    }

    /// Savings accounts of the caller, each with its pockets and total.
    pub async fn list_savings(&self, actor: Actor) -> ResultEngine<Vec<Savings>> {
        with_tx!(self, |db_tx| {
            let models = savings::Entity::find()
                .filter(savings::Column::AccountId.eq(actor.account_id))
                .filter(savings::Column::Deleted.is_null())
                .order_by_asc(savings::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            self.savings_with_pockets(&db_tx, models).await
        })
    }

    pub async fn savings(&self, actor: Actor, savings_id: Uuid) -> ResultEngine<Savings> {
        with_tx!(self, |db_tx| {
            let model = self.require_savings(&db_tx, actor, savings_id).await?;
            self.savings_with_pockets(&db_tx, vec![model])
                .await?
                .pop()
                .ok_or_else(|| EngineError::KeyNotFound("savings not exists".to_string()))
        })
    }

    pub async fn create_savings(&self, actor: Actor, name: &str) -> ResultEngine<Savings> {
        let name = normalize_display_name(name, "savings")?;
        with_tx!(self, |db_tx| {
            let model = savings::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                account_id: ActiveValue::Set(actor.account_id),
                name: ActiveValue::Set(name),
                created_at: ActiveValue::Set(Utc::now()),
                deleted: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            Savings::from_model(model, Vec::new())
        })
    }

    pub async fn update_savings(
        &self,
        actor: Actor,
        savings_id: Uuid,
        name: &str,
    ) -> ResultEngine<Savings> {
        let name = normalize_display_name(name, "savings")?;
        with_tx!(self, |db_tx| {
            let model = self.require_savings(&db_tx, actor, savings_id).await?;
            let mut active: savings::ActiveModel = model.into();
            active.name = ActiveValue::Set(name);
            let model = active.update(&db_tx).await?;
            self.savings_with_pockets(&db_tx, vec![model])
                .await?
                .pop()
                .ok_or_else(|| EngineError::KeyNotFound("savings not exists".to_string()))
        })
    }

    /// Soft-delete a savings account with its pockets and their allocations.
    pub async fn delete_savings(&self, actor: Actor, savings_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_savings(&db_tx, actor, savings_id).await?;
            let now = Utc::now();
            let pocket_ids: Vec<Uuid> = pockets::Entity::find()
                .filter(pockets::Column::SavingsId.eq(model.id))
                .filter(pockets::Column::Deleted.is_null())
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|pocket| pocket.id)
                .collect();
            allocations::Entity::update_many()
                .col_expr(allocations::Column::Deleted, Expr::value(now))
                .filter(allocations::Column::PocketId.is_in(pocket_ids.clone()))
                .filter(allocations::Column::Deleted.is_null())
                .exec(&db_tx)
                .await?;
            pockets::Entity::update_many()
                .col_expr(pockets::Column::Deleted, Expr::value(now))
                .filter(pockets::Column::Id.is_in(pocket_ids))
                .exec(&db_tx)
                .await?;
            let mut active: savings::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(now));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }
}
