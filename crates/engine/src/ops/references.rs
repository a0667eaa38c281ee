//! Single-row operations and user-cascade flips for the per-owner reference
//! tables (consumers, receivers, locations).
//!
//! Renames run against the `(user_id, name)` unique index and surface a
//! conflict as `ExistingKey` instead of checking first. Renames are allowed
//! on soft-deleted rows; lookups and single deletes only touch live ones.

use chrono::{DateTime, Utc};
use sea_orm::{
    DatabaseTransaction, QueryFilter, SqlErr, Statement, TransactionTrait, prelude::*,
};

use crate::{EngineError, ResultEngine, exec};

use super::{Engine, normalize_required_name, with_tx};

/// Generates the lookup, rename, lifecycle flips and user-cascade flips for
/// one per-owner reference table.
macro_rules! impl_reference_ops {
    (
        $getter_fn:ident,
        $rename_fn:ident,
        $delete_fn:ident,
        $restore_fn:ident,
        $delete_for_user_fn:ident,
        $restore_for_user_fn:ident,
        $module:ident,
        $domain:ident,
        $table:literal,
        $label:literal,
        $err_msg:literal
    ) => {
        pub async fn $getter_fn(&self, id: i32, user_id: i64) -> ResultEngine<crate::$domain> {
            with_tx!(self, |db_tx| {
                let model = crate::$module::Entity::find_by_id(id)
                    .filter(crate::$module::Column::UserId.eq(user_id))
                    .filter(crate::$module::Column::DeletedAt.is_null())
                    .one(&db_tx)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))?;
                Ok(crate::$domain::from(model))
            })
        }

        pub async fn $rename_fn(
            &self,
            id: i32,
            name: &str,
            user_id: i64,
        ) -> ResultEngine<crate::$domain> {
            let name = normalize_required_name(name, $label)?;
            with_tx!(self, |db_tx| {
                let backend = db_tx.get_database_backend();
                let now = Utc::now();
                let stmt = Statement::from_sql_and_values(
                    backend,
                    concat!(
                        "UPDATE ",
                        $table,
                        " SET name = ?, updated_at = ? \
                         WHERE id = ? AND user_id = ? \
                         RETURNING *;"
                    ),
                    vec![name.as_str().into(), now.into(), id.into(), user_id.into()],
                );
                let updated: ResultEngine<crate::$module::Model> =
                    exec::one(&db_tx, stmt, concat!("Could not update the ", $label, ".")).await;
                match updated {
                    Err(EngineError::Database(err))
                        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
                    {
                        Err(EngineError::ExistingKey(name))
                    }
                    other => other.map(crate::$domain::from),
                }
            })
        }

        pub async fn $delete_fn(&self, id: i32, user_id: i64) -> ResultEngine<crate::$domain> {
            with_tx!(self, |db_tx| {
                let backend = db_tx.get_database_backend();
                let now = Utc::now();
                let stmt = Statement::from_sql_and_values(
                    backend,
                    concat!(
                        "UPDATE ",
                        $table,
                        " SET deleted_at = ?, updated_at = ? \
                         WHERE id = ? AND user_id = ? AND deleted_at IS NULL \
                         RETURNING *;"
                    ),
                    vec![now.into(), now.into(), id.into(), user_id.into()],
                );
                let model: crate::$module::Model =
                    exec::one(&db_tx, stmt, concat!("Could not delete the ", $label, ".")).await?;
                Ok(crate::$domain::from(model))
            })
        }

        pub async fn $restore_fn(&self, id: i32, user_id: i64) -> ResultEngine<crate::$domain> {
            with_tx!(self, |db_tx| {
                let backend = db_tx.get_database_backend();
                let now = Utc::now();
                let stmt = Statement::from_sql_and_values(
                    backend,
                    concat!(
                        "UPDATE ",
                        $table,
                        " SET deleted_at = NULL, updated_at = ? \
                         WHERE id = ? AND user_id = ? AND deleted_at IS NOT NULL \
                         RETURNING *;"
                    ),
                    vec![now.into(), id.into(), user_id.into()],
                );
                let model: crate::$module::Model =
                    exec::one(&db_tx, stmt, concat!("Could not restore the ", $label, ".")).await?;
                Ok(crate::$domain::from(model))
            })
        }

        pub(super) async fn $delete_for_user_fn(
            db_tx: &DatabaseTransaction,
            user_id: i64,
            deleted_at: DateTime<Utc>,
        ) -> ResultEngine<Vec<crate::$module::Model>> {
            let backend = db_tx.get_database_backend();
            let stmt = Statement::from_sql_and_values(
                backend,
                concat!(
                    "UPDATE ",
                    $table,
                    " SET deleted_at = ?, updated_at = ? \
                     WHERE user_id = ? AND deleted_at IS NULL \
                     RETURNING *;"
                ),
                vec![deleted_at.into(), deleted_at.into(), user_id.into()],
            );
            exec::many(db_tx, stmt, None).await
        }

        pub(super) async fn $restore_for_user_fn(
            db_tx: &DatabaseTransaction,
            user_id: i64,
            deleted_at: DateTime<Utc>,
            restored_at: DateTime<Utc>,
        ) -> ResultEngine<Vec<crate::$module::Model>> {
            let backend = db_tx.get_database_backend();
            let stmt = Statement::from_sql_and_values(
                backend,
                concat!(
                    "UPDATE ",
                    $table,
                    " SET deleted_at = NULL, updated_at = ? \
                     WHERE user_id = ? AND deleted_at = ? \
                     RETURNING *;"
                ),
                vec![restored_at.into(), user_id.into(), deleted_at.into()],
            );
            exec::many(db_tx, stmt, None).await
        }
    };
}

impl Engine {
    impl_reference_ops!(
        consumer,
        rename_consumer,
        delete_consumer,
        restore_consumer,
        delete_consumers_for_user,
        restore_consumers_for_user,
        consumers,
        Consumer,
        "consumers",
        "consumer",
        "consumer not exists"
    );

    impl_reference_ops!(
        receiver,
        rename_receiver,
        delete_receiver,
        restore_receiver,
        delete_receivers_for_user,
        restore_receivers_for_user,
        receivers,
        Receiver,
        "receivers",
        "receiver",
        "receiver not exists"
    );

    impl_reference_ops!(
        location,
        rename_location,
        delete_location,
        restore_location,
        delete_locations_for_user,
        restore_locations_for_user,
        locations,
        Location,
        "locations",
        "location",
        "location not exists"
    );
}
