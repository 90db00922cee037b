use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::Engine as _;
use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, NewUserCmd, ResultEngine, Session, SignUpCmd, User, accounts,
    password::{hash_password, verify_password},
    sessions, users,
    util::{normalize_display_name, normalize_email},
};

use super::{Engine, with_tx};

const MIN_PASSWORD_LEN: usize = 8;
const TOKEN_BYTES: usize = 32;

pub(super) fn validate_password(password: &str) -> ResultEngine<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::InvalidValue(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

impl Engine {
    /// Fails with `ExistingKey` when a live user already uses `email`.
    pub(super) async fn ensure_email_free(
        &self,
        db: &DatabaseTransaction,
        email: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::Deleted.is_null());
        if let Some(user_id) = except {
            query = query.filter(users::Column::Id.ne(user_id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(email.to_string()));
        }
        Ok(())
    }

    pub(super) async fn insert_user(
        &self,
        db: &DatabaseTransaction,
        account_id: Uuid,
        cmd: &NewUserCmd,
    ) -> ResultEngine<User> {
        let email = normalize_email(&cmd.email)?;
        let name = normalize_display_name(&cmd.name, "user")?;
        validate_password(&cmd.password)?;
        self.ensure_email_free(db, &email, None).await?;

        let model = users::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            account_id: ActiveValue::Set(account_id),
            email: ActiveValue::Set(email),
            name: ActiveValue::Set(name),
            password_hash: ActiveValue::Set(hash_password(&cmd.password)?),
            created_at: ActiveValue::Set(Utc::now()),
            deleted: ActiveValue::Set(None),
        }
        .insert(db)
        .await?;
        Ok(User::from(model))
    }

    async fn open_session(&self, db: &DatabaseTransaction, user: User) -> ResultEngine<Session> {
        let now = Utc::now();
        let expires_at = now + self.session_ttl;
        let token = new_session_token();
        sessions::ActiveModel {
            token: ActiveValue::Set(token.clone()),
            user_id: ActiveValue::Set(user.id),
            created_at: ActiveValue::Set(now),
            expires_at: ActiveValue::Set(expires_at),
        }
        .insert(db)
        .await?;
        Ok(Session {
            token,
            expires_at,
            user,
        })
    }

    /// Open a new account with its first user and sign that user in.
    pub async fn sign_up(&self, cmd: SignUpCmd) -> ResultEngine<Session> {
        let new_user = NewUserCmd {
            email: cmd.email,
            name: cmd.name,
            password: cmd.password,
        };
        with_tx!(self, |db_tx| {
            let user_name = normalize_display_name(&new_user.name, "user")?;
            let account_name = match cmd.account_name.as_deref() {
                Some(name) => normalize_display_name(name, "account")?,
                None => format!("{user_name}'s account"),
            };
            let account = accounts::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                name: ActiveValue::Set(account_name),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            let user = self.insert_user(&db_tx, account.id, &new_user).await?;
            tracing::info!(user_id = %user.id, account_id = %account.id, "account created");
            self.open_session(&db_tx, user).await
        })
    }

    /// Check the credentials and open a session.
    ///
    /// An unknown email and a wrong password fail the same way.
    pub async fn sign_in(&self, email: &str, password: &str) -> ResultEngine<Session> {
        let email = email.trim().to_lowercase();
        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Email.eq(email.as_str()))
                .filter(users::Column::Deleted.is_null())
                .one(&db_tx)
                .await?
                .ok_or(EngineError::InvalidCredentials)?;
            if !verify_password(password, &model.password_hash)? {
                return Err(EngineError::InvalidCredentials);
            }
            self.open_session(&db_tx, User::from(model)).await
        })
    }

    /// The user behind a live session.
    ///
    /// Expired sessions are removed on lookup.
    pub async fn session_user(&self, token: &str) -> ResultEngine<User> {
        let found: Option<User> = with_tx!(self, |db_tx| {
            let Some(session) = sessions::Entity::find_by_id(token.to_string())
                .one(&db_tx)
                .await?
            else {
                return Err(EngineError::Unauthorized("invalid session".to_string()));
            };
            if session.expires_at <= Utc::now() {
                sessions::Entity::delete_by_id(session.token)
                    .exec(&db_tx)
                    .await?;
                Ok(None)
            } else {
                users::Entity::find_by_id(session.user_id)
                    .filter(users::Column::Deleted.is_null())
                    .one(&db_tx)
                    .await
                    .map(|model| model.map(User::from))
                    .map_err(EngineError::from)
            }
        })?;
        found.ok_or_else(|| EngineError::Unauthorized("session expired".to_string()))
    }

    pub async fn sign_out(&self, token: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            sessions::Entity::delete_by_id(token.to_string())
                .exec(&db_tx)
                .await?;
            Ok::<(), EngineError>(())
        })
    }
}
