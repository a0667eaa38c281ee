//! User mutations and the cascades over everything a user owns.
//!
//! Every operation here runs as one transaction scoped by the acting user,
//! commits, then emits its [`UserEvent`]. A failed publish reaches the
//! caller as `Publish` while the committed state stands.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, SqlErr, Statement, TransactionTrait, prelude::*,
};

use crate::{EngineError, ResultEngine, User, UserCmd, UserEvent, exec, users};

use super::{Engine, with_tx};

impl Engine {
    /// Create a user account recorded as created by the acting user.
    ///
    /// Emails are unique over live and soft-deleted rows alike, so an address
    /// freed by a soft delete still conflicts.
    pub async fn create_user(&self, cmd: UserCmd, acting_user_id: i64) -> ResultEngine<User> {
        let (created, acting) = with_tx!(self, |db_tx| {
            let acting = Self::require_user(&db_tx, acting_user_id).await?;

            let now = Utc::now();
            let email = cmd.email.clone();
            let inserted = users::ActiveModel {
                id: ActiveValue::Set(cmd.id),
                first_name: ActiveValue::Set(cmd.first_name),
                last_name: ActiveValue::Set(cmd.last_name),
                email: ActiveValue::Set(cmd.email),
                password: ActiveValue::Set(cmd.password),
                phone: ActiveValue::Set(cmd.phone),
                role: ActiveValue::Set(cmd.role),
                created_by: ActiveValue::Set(Some(acting.id)),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                deleted_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await;
            let created = match inserted {
                Err(err)
                    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                {
                    return Err(EngineError::ExistingKey(email));
                }
                other => other?,
            };

            Ok::<_, EngineError>((created, acting))
        })?;

        let created = User::from(created);
        self.notify(UserEvent::CreatedUser {
            payload: created.clone(),
            user: User::from(acting),
        })
        .await?;
        Ok(created)
    }

    /// Rewrite the profile of a user the acting user created.
    pub async fn update_user(&self, cmd: UserCmd, acting_user_id: i64) -> ResultEngine<User> {
        let (updated, acting) = with_tx!(self, |db_tx| {
            let acting = Self::require_user(&db_tx, acting_user_id).await?;

            let backend = db_tx.get_database_backend();
            let now = Utc::now();
            let stmt = Statement::from_sql_and_values(
                backend,
                "UPDATE users \
                 SET first_name = ?, last_name = ?, email = ?, password = ?, phone = ?, \
                     role = ?, updated_at = ? \
                 WHERE id = ? AND created_by = ? \
                 RETURNING *;",
                vec![
                    cmd.first_name.into(),
                    cmd.last_name.into(),
                    cmd.email.into(),
                    cmd.password.into(),
                    cmd.phone.into(),
                    cmd.role.into(),
                    now.into(),
                    cmd.id.into(),
                    acting.id.into(),
                ],
            );
            let updated: users::Model =
                exec::one(&db_tx, stmt, "Could not update the user.").await?;

            Ok::<_, EngineError>((updated, acting))
        })?;

        let updated = User::from(updated);
        self.notify(UserEvent::UpdatedUser {
            payload: updated.clone(),
            user: User::from(acting),
        })
        .await?;
        Ok(updated)
    }

    /// Soft-delete a user the acting user created, along with every bill,
    /// consumer, receiver and location the user owns.
    ///
    /// The user row and the cascaded rows share one deletion timestamp, which
    /// is what [`Engine::restore_user`] anchors on.
    pub async fn delete_user(&self, user_id: i64, acting_user_id: i64) -> ResultEngine<User> {
        let (deleted, acting) = with_tx!(self, |db_tx| {
            let acting = Self::require_user(&db_tx, acting_user_id).await?;

            let backend = db_tx.get_database_backend();
            let now = Utc::now();
            let stmt = Statement::from_sql_and_values(
                backend,
                "UPDATE users SET deleted_at = ?, updated_at = ? \
                 WHERE id = ? AND created_by = ? AND deleted_at IS NULL \
                 RETURNING *;",
                vec![now.into(), now.into(), user_id.into(), acting.id.into()],
            );
            let deleted: users::Model =
                exec::one(&db_tx, stmt, "Could not delete the user.").await?;

            Self::delete_bills_for_user(&db_tx, deleted.id, now).await?;
            Self::delete_consumers_for_user(&db_tx, deleted.id, now).await?;
            Self::delete_receivers_for_user(&db_tx, deleted.id, now).await?;
            Self::delete_locations_for_user(&db_tx, deleted.id, now).await?;

            Ok::<_, EngineError>((deleted, acting))
        })?;

        let deleted = User::from(deleted);
        self.notify(UserEvent::DeletedUser {
            payload: deleted.clone(),
            user: User::from(acting),
        })
        .await?;
        Ok(deleted)
    }

    /// Bring a soft-deleted user back, along with the rows that went down
    /// with it.
    ///
    /// Only rows stamped by that delete come back: a bill or consumer the
    /// user had deleted on their own beforehand keeps its older stamp and
    /// stays deleted.
    pub async fn restore_user(&self, user_id: i64, acting_user_id: i64) -> ResultEngine<User> {
        let (restored, acting) = with_tx!(self, |db_tx| {
            let acting = Self::require_user(&db_tx, acting_user_id).await?;

            let target = users::Entity::find_by_id(user_id)
                .filter(users::Column::CreatedBy.eq(acting.id))
                .one(&db_tx)
                .await?;
            let Some(deleted_at) = target.and_then(|user| user.deleted_at) else {
                return Err(EngineError::NoEffect(
                    "Could not restore the user.".to_string(),
                ));
            };

            let backend = db_tx.get_database_backend();
            let now = Utc::now();
            let stmt = Statement::from_sql_and_values(
                backend,
                "UPDATE users SET deleted_at = NULL, updated_at = ? \
                 WHERE id = ? AND created_by = ? AND deleted_at IS NOT NULL \
                 RETURNING *;",
                vec![now.into(), user_id.into(), acting.id.into()],
            );
            let restored: users::Model =
                exec::one(&db_tx, stmt, "Could not restore the user.").await?;

            Self::restore_bills_for_user(&db_tx, restored.id, deleted_at, now).await?;
            Self::restore_consumers_for_user(&db_tx, restored.id, deleted_at, now).await?;
            Self::restore_receivers_for_user(&db_tx, restored.id, deleted_at, now).await?;
            Self::restore_locations_for_user(&db_tx, restored.id, deleted_at, now).await?;

            Ok::<_, EngineError>((restored, acting))
        })?;

        let restored = User::from(restored);
        self.notify(UserEvent::RestoredUser {
            payload: restored.clone(),
            user: User::from(acting),
        })
        .await?;
        Ok(restored)
    }

    /// The acting account behind a mutation. Must exist and be live.
    async fn require_user(
        db_tx: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .filter(users::Column::DeletedAt.is_null())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
