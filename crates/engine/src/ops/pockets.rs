use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Actor, EngineError, Pocket, PocketCmd, PocketUpdate, ResultEngine, allocations, pockets,
    util::normalize_display_name,
};

use super::{Engine, require_positive, with_tx};

impl Engine {
    async fn single_pocket(
        &self,
        db: &DatabaseTransaction,
        model: pockets::Model,
    ) -> ResultEngine<Pocket> {
        let pocket_id = model.id;
        self.load_pockets(db, vec![model.savings_id])
            .await?
            .into_iter()
            .find(|pocket| pocket.id == pocket_id)
            .ok_or_else(|| EngineError::KeyNotFound("pocket not exists".to_string()))
    }

    pub async fn list_pockets(&self, actor: Actor, savings_id: Uuid) -> ResultEngine<Vec<Pocket>> {
        with_tx!(self, |db_tx| {
            self.require_savings(&db_tx, actor, savings_id).await?;
            self.load_pockets(&db_tx, vec![savings_id]).await
        })
    }

    /// A pocket with its total and goal progress.
    pub async fn pocket(&self, actor: Actor, pocket_id: Uuid) -> ResultEngine<Pocket> {
        with_tx!(self, |db_tx| {
            let model = self.require_pocket(&db_tx, actor, pocket_id).await?;
            self.single_pocket(&db_tx, model).await
        })
    }

    pub async fn create_pocket(
        &self,
        actor: Actor,
        savings_id: Uuid,
        cmd: PocketCmd,
    ) -> ResultEngine<Pocket> {
        let name = normalize_display_name(&cmd.name, "pocket")?;
        let goal_minor = cmd
            .goal_minor
            .map(|goal| require_positive(goal, "pocket goal"))
            .transpose()?;
        with_tx!(self, |db_tx| {
            self.require_savings(&db_tx, actor, savings_id).await?;
            let model = pockets::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                account_id: ActiveValue::Set(actor.account_id),
                savings_id: ActiveValue::Set(savings_id),
                name: ActiveValue::Set(name),
                goal_minor: ActiveValue::Set(goal_minor),
                goal_at: ActiveValue::Set(cmd.goal_at),
                created_at: ActiveValue::Set(Utc::now()),
                deleted: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            Pocket::from_model(model, &[])
        })
    }

    pub async fn update_pocket(
        &self,
        actor: Actor,
        pocket_id: Uuid,
        update: PocketUpdate,
    ) -> ResultEngine<Pocket> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_display_name(name, "pocket"))
            .transpose()?;
        let goal_minor = update
            .goal_minor
            .map(|goal| goal.map(|goal| require_positive(goal, "pocket goal")).transpose())
            .transpose()?;
        with_tx!(self, |db_tx| {
            let model = self.require_pocket(&db_tx, actor, pocket_id).await?;
            let mut active: pockets::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(goal_minor) = goal_minor {
                active.goal_minor = ActiveValue::Set(goal_minor);
            }
            if let Some(goal_at) = update.goal_at {
                active.goal_at = ActiveValue::Set(goal_at);
            }
            let model = active.update(&db_tx).await?;
            self.single_pocket(&db_tx, model).await
        })
    }

    /// Soft-delete a pocket with its allocations.
    pub async fn delete_pocket(&self, actor: Actor, pocket_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_pocket(&db_tx, actor, pocket_id).await?;
            let now = Utc::now();
            allocations::Entity::update_many()
                .col_expr(allocations::Column::Deleted, Expr::value(now))
                .filter(allocations::Column::PocketId.eq(model.id))
                .filter(allocations::Column::Deleted.is_null())
                .exec(&db_tx)
                .await?;
            let mut active: pockets::ActiveModel = model.into();
            active.deleted = ActiveValue::Set(Some(now));
            active.update(&db_tx).await?;
            Ok::<(), EngineError>(())
        })
    }
}
