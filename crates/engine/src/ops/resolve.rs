//! Get-or-create resolution for bill references.
//!
//! Bills name their receiver, location and consumers as plain strings. The
//! resolvers turn those names into rows for the owning user, creating rows
//! that do not exist yet. Soft-deleted rows resolve like live ones, so a
//! name keeps pointing at the same row across delete/restore cycles.
//!
//! Creation goes through `INSERT ... ON CONFLICT DO NOTHING RETURNING` on
//! the `(user_id, name)` unique index, so two writers racing on the same
//! name both end up with the one row.

use chrono::Utc;
use sea_orm::{DatabaseTransaction, FromQueryResult, QueryFilter, Statement, prelude::*};

use crate::{EngineError, ResultEngine, consumers};

use super::Engine;

/// Generates a get-or-create resolver for one per-owner reference table.
macro_rules! impl_resolve_one {
    ($fn_name:ident, $module:ident, $table:literal, $err_msg:literal) => {
        pub(super) async fn $fn_name(
            db_tx: &DatabaseTransaction,
            user_id: i64,
            name: &str,
        ) -> ResultEngine<crate::$module::Model> {
            if let Some(model) = crate::$module::Entity::find()
                .filter(crate::$module::Column::UserId.eq(user_id))
                .filter(crate::$module::Column::Name.eq(name))
                .one(db_tx)
                .await?
            {
                return Ok(model);
            }

            let backend = db_tx.get_database_backend();
            let now = Utc::now();
            let stmt = Statement::from_sql_and_values(
                backend,
                concat!(
                    "INSERT INTO ",
                    $table,
                    " (name, user_id, created_at, updated_at) VALUES (?, ?, ?, ?) ",
                    "ON CONFLICT (user_id, name) DO NOTHING RETURNING *;"
                ),
                vec![name.into(), user_id.into(), now.into(), now.into()],
            );
            if let Some(model) = crate::$module::Model::find_by_statement(stmt)
                .one(db_tx)
                .await?
            {
                return Ok(model);
            }

            // The insert conflicted, so the row exists: fetch it.
            crate::$module::Entity::find()
                .filter(crate::$module::Column::UserId.eq(user_id))
                .filter(crate::$module::Column::Name.eq(name))
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))
        }
    };
}

impl Engine {
    impl_resolve_one!(
        resolve_receiver,
        receivers,
        "receivers",
        "receiver not exists"
    );

    impl_resolve_one!(
        resolve_location,
        locations,
        "locations",
        "location not exists"
    );

    /// Resolve every named consumer for the owner in one pass, creating the
    /// rows that do not exist yet.
    ///
    /// Callers pass deduplicated names. The result carries soft-deleted rows
    /// as-is; whether a deleted consumer is acceptable is the caller's call.
    pub(super) async fn resolve_consumers(
        db_tx: &DatabaseTransaction,
        user_id: i64,
        names: &[String],
    ) -> ResultEngine<Vec<consumers::Model>> {
        let mut resolved = consumers::Entity::find()
            .filter(consumers::Column::UserId.eq(user_id))
            .filter(consumers::Column::Name.is_in(names.iter().map(String::as_str)))
            .all(db_tx)
            .await?;

        let missing: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|name| !resolved.iter().any(|model| model.name == *name))
            .collect();
        if missing.is_empty() {
            return Ok(resolved);
        }

        let backend = db_tx.get_database_backend();
        let now = Utc::now();
        let placeholders = vec!["(?, ?, ?, ?)"; missing.len()].join(", ");
        let mut values: Vec<sea_orm::Value> = Vec::with_capacity(missing.len() * 4);
        for name in &missing {
            values.push((*name).into());
            values.push(user_id.into());
            values.push(now.into());
            values.push(now.into());
        }
        let stmt = Statement::from_sql_and_values(
            backend,
            format!(
                "INSERT INTO consumers (name, user_id, created_at, updated_at) \
                 VALUES {placeholders} \
                 ON CONFLICT (user_id, name) DO NOTHING RETURNING *;"
            ),
            values,
        );
        let created = consumers::Model::find_by_statement(stmt).all(db_tx).await?;
        resolved.extend(created);

        if resolved.len() < names.len() {
            // Some inserts conflicted, so those rows exist: fetch them.
            let leftover: Vec<&str> = names
                .iter()
                .map(String::as_str)
                .filter(|name| !resolved.iter().any(|model| model.name == *name))
                .collect();
            let found = consumers::Entity::find()
                .filter(consumers::Column::UserId.eq(user_id))
                .filter(consumers::Column::Name.is_in(leftover))
                .all(db_tx)
                .await?;
            resolved.extend(found);
        }

        Ok(resolved)
    }
}
