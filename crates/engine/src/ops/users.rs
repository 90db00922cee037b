use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Actor, EngineError, NewUserCmd, ResultEngine, User, UserUpdate,
    password::hash_password,
    users,
    util::{normalize_display_name, normalize_email},
};

use super::{Engine, auth::validate_password, with_tx};

impl Engine {
    pub async fn current_user(&self, actor: Actor) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            users::Entity::find_by_id(actor.user_id)
                .filter(users::Column::AccountId.eq(actor.account_id))
                .filter(users::Column::Deleted.is_null())
                .one(&db_tx)
                .await?
                .map(User::from)
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
        })
    }

    /// Change the caller's own name, email or password.
    pub async fn update_user(&self, actor: Actor, update: UserUpdate) -> ResultEngine<User> {
        let name = update
            .name
            .as_deref()
            .map(|name| normalize_display_name(name, "user"))
            .transpose()?;
        let email = update.email.as_deref().map(normalize_email).transpose()?;
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        with_tx!(self, |db_tx| {
            let current = users::Entity::find_by_id(actor.user_id)
                .filter(users::Column::Deleted.is_null())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
            if let Some(email) = email.as_deref() {
                self.ensure_email_free(&db_tx, email, Some(current.id))
                    .await?;
            }

            let mut active: users::ActiveModel = current.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(email) = email {
                active.email = ActiveValue::Set(email);
            }
            if let Some(password_hash) = password_hash {
                active.password_hash = ActiveValue::Set(password_hash);
            }
            let model = active.update(&db_tx).await?;
            Ok(User::from(model))
        })
    }

    /// Members of the caller's account, oldest first.
    pub async fn list_users(&self, actor: Actor) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            let models = users::Entity::find()
                .filter(users::Column::AccountId.eq(actor.account_id))
                .filter(users::Column::Deleted.is_null())
                .order_by_asc(users::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            Ok::<_, EngineError>(models.into_iter().map(User::from).collect())
        })
    }

    /// Create another user inside the caller's account.
    pub async fn add_user(&self, actor: Actor, cmd: NewUserCmd) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let user = self.insert_user(&db_tx, actor.account_id, &cmd).await?;
            tracing::info!(user_id = %user.id, account_id = %actor.account_id, "user added");
            Ok(user)
        })
    }
}
