use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, Statement, TransactionTrait, prelude::*,
};

use crate::{Bill, BillCmd, EngineError, ResultEngine, bill_consumers, bills, exec};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Record a new bill for the user named in the command.
    ///
    /// Receiver, location and consumers are given by name and resolved
    /// against the owner's reference sets, creating rows as needed. Amount
    /// must be a non-negative integral string, and the consumer list must
    /// hold between 1 and 20 distinct names.
    pub async fn create_bill(&self, cmd: BillCmd) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| {
            let amount = validate_amount(&cmd.amount)?;
            let receiver_name = normalize_required_name(&cmd.receiver, "receiver")?;
            let location_name = normalize_required_name(&cmd.location, "location")?;
            let consumer_names = normalize_consumer_names(&cmd.consumers)?;

            let receiver = Self::resolve_receiver(&db_tx, cmd.user_id, &receiver_name).await?;
            let location = Self::resolve_location(&db_tx, cmd.user_id, &location_name).await?;
            let consumers = Self::resolve_consumers(&db_tx, cmd.user_id, &consumer_names).await?;

            let now = Utc::now();
            let bill = bills::ActiveModel {
                id: ActiveValue::NotSet,
                amount: ActiveValue::Set(amount),
                description: ActiveValue::Set(cmd.description),
                date: ActiveValue::Set(cmd.date),
                user_id: ActiveValue::Set(cmd.user_id),
                receiver_id: ActiveValue::Set(receiver.id),
                location_id: ActiveValue::Set(location.id),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
                deleted_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;

            Self::link_consumers(&db_tx, bill.id, &consumers).await?;

            Ok(Bill::from_parts(bill, receiver, location, consumers))
        })
    }

    /// Rewrite one live bill owned by the user named in the command.
    ///
    /// References resolve exactly like on create, with one extra rule: a
    /// consumer that resolved to a soft-deleted row rejects the update, so
    /// callers restore the consumer first instead of silently splitting a
    /// bill over someone who was removed.
    pub async fn update_bill(&self, bill_id: i64, cmd: BillCmd) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| {
            let amount = validate_amount(&cmd.amount)?;
            let receiver_name = normalize_required_name(&cmd.receiver, "receiver")?;
            let location_name = normalize_required_name(&cmd.location, "location")?;
            let consumer_names = normalize_consumer_names(&cmd.consumers)?;

            let consumers = Self::resolve_consumers(&db_tx, cmd.user_id, &consumer_names).await?;
            let receiver = Self::resolve_receiver(&db_tx, cmd.user_id, &receiver_name).await?;
            let location = Self::resolve_location(&db_tx, cmd.user_id, &location_name).await?;

            if let Some(deleted) = consumers
                .iter()
                .find(|consumer| consumer.deleted_at.is_some())
            {
                return Err(EngineError::InvalidConsumers(format!(
                    "Consumer \"{}\" was deleted try to restore it then update the bill.",
                    deleted.name
                )));
            }

            Self::require_active_bill(&db_tx, bill_id, cmd.user_id).await?;

            let backend = db_tx.get_database_backend();
            let now = Utc::now();
            let stmt = Statement::from_sql_and_values(
                backend,
                "UPDATE bills \
                 SET amount = ?, description = ?, date = ?, receiver_id = ?, location_id = ?, updated_at = ? \
                 WHERE id = ? AND user_id = ? AND deleted_at IS NULL \
                 RETURNING *;",
                vec![
                    amount.into(),
                    cmd.description.into(),
                    cmd.date.into(),
                    receiver.id.into(),
                    location.id.into(),
                    now.into(),
                    bill_id.into(),
                    cmd.user_id.into(),
                ],
            );
            let bill: bills::Model = exec::one(&db_tx, stmt, "Could not update the bill.").await?;

            bill_consumers::Entity::delete_many()
                .filter(bill_consumers::Column::BillId.eq(bill.id))
                .exec(&db_tx)
                .await?;
            Self::link_consumers(&db_tx, bill.id, &consumers).await?;

            Ok(Bill::from_parts(bill, receiver, location, consumers))
        })
    }

    /// Soft-delete one live bill owned by the user.
    pub async fn delete_bill(&self, bill_id: i64, user_id: i64) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| {
            let backend = db_tx.get_database_backend();
            let now = Utc::now();
            let stmt = Statement::from_sql_and_values(
                backend,
                "UPDATE bills SET deleted_at = ?, updated_at = ? \
                 WHERE id = ? AND user_id = ? AND deleted_at IS NULL \
                 RETURNING *;",
                vec![now.into(), now.into(), bill_id.into(), user_id.into()],
            );
            let bill: bills::Model = exec::one(&db_tx, stmt, "Could not delete the bill.").await?;
            Self::assemble_bill(&db_tx, bill).await
        })
    }

    /// Bring one soft-deleted bill owned by the user back.
    pub async fn restore_bill(&self, bill_id: i64, user_id: i64) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| {
            let backend = db_tx.get_database_backend();
            let now = Utc::now();
            let stmt = Statement::from_sql_and_values(
                backend,
                "UPDATE bills SET deleted_at = NULL, updated_at = ? \
                 WHERE id = ? AND user_id = ? AND deleted_at IS NOT NULL \
                 RETURNING *;",
                vec![now.into(), bill_id.into(), user_id.into()],
            );
            let bill: bills::Model = exec::one(&db_tx, stmt, "Could not restore the bill.").await?;
            Self::assemble_bill(&db_tx, bill).await
        })
    }

    /// Load one live bill with its receiver, location and consumers.
    pub async fn bill(&self, bill_id: i64, user_id: i64) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| {
            let bill = Self::require_active_bill(&db_tx, bill_id, user_id).await?;
            Self::assemble_bill(&db_tx, bill).await
        })
    }

    /// Load one soft-deleted bill with its references.
    pub async fn deleted_bill(&self, bill_id: i64, user_id: i64) -> ResultEngine<Bill> {
        with_tx!(self, |db_tx| {
            let bill = bills::Entity::find_by_id(bill_id)
                .filter(bills::Column::UserId.eq(user_id))
                .filter(bills::Column::DeletedAt.is_not_null())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("bill not exists".to_string()))?;
            Self::assemble_bill(&db_tx, bill).await
        })
    }

    /// Flip every live bill of the user to deleted, stamped with the
    /// cascade instant.
    pub(super) async fn delete_bills_for_user(
        db_tx: &DatabaseTransaction,
        user_id: i64,
        deleted_at: DateTime<Utc>,
    ) -> ResultEngine<Vec<bills::Model>> {
        let backend = db_tx.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "UPDATE bills SET deleted_at = ?, updated_at = ? \
             WHERE user_id = ? AND deleted_at IS NULL \
             RETURNING *;",
            vec![deleted_at.into(), deleted_at.into(), user_id.into()],
        );
        exec::many(db_tx, stmt, None).await
    }

    /// Bring back the bills deleted by the cascade stamped `deleted_at`.
    ///
    /// Bills the user had deleted on their own keep their older stamp and
    /// stay deleted.
    pub(super) async fn restore_bills_for_user(
        db_tx: &DatabaseTransaction,
        user_id: i64,
        deleted_at: DateTime<Utc>,
        restored_at: DateTime<Utc>,
    ) -> ResultEngine<Vec<bills::Model>> {
        let backend = db_tx.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "UPDATE bills SET deleted_at = NULL, updated_at = ? \
             WHERE user_id = ? AND deleted_at = ? \
             RETURNING *;",
            vec![restored_at.into(), user_id.into(), deleted_at.into()],
        );
        exec::many(db_tx, stmt, None).await
    }

    pub(super) async fn require_active_bill(
        db_tx: &DatabaseTransaction,
        bill_id: i64,
        user_id: i64,
    ) -> ResultEngine<bills::Model> {
        bills::Entity::find_by_id(bill_id)
            .filter(bills::Column::UserId.eq(user_id))
            .filter(bills::Column::DeletedAt.is_null())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bill not exists".to_string()))
    }

    async fn assemble_bill(db_tx: &DatabaseTransaction, bill: bills::Model) -> ResultEngine<Bill> {
        let receiver = crate::receivers::Entity::find_by_id(bill.receiver_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("receiver not exists".to_string()))?;
        let location = crate::locations::Entity::find_by_id(bill.location_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("location not exists".to_string()))?;
        let consumers = bill.find_related(crate::consumers::Entity).all(db_tx).await?;
        Ok(Bill::from_parts(bill, receiver, location, consumers))
    }

    async fn link_consumers(
        db_tx: &DatabaseTransaction,
        bill_id: i64,
        consumers: &[crate::consumers::Model],
    ) -> ResultEngine<()> {
        let links: Vec<bill_consumers::ActiveModel> = consumers
            .iter()
            .map(|consumer| bill_consumers::ActiveModel {
                bill_id: ActiveValue::Set(bill_id),
                consumer_id: ActiveValue::Set(consumer.id),
            })
            .collect();
        bill_consumers::Entity::insert_many(links).exec(db_tx).await?;
        Ok(())
    }
}

fn validate_amount(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 18 {
        return Err(EngineError::InvalidAmount(
            "amount must be 1 to 18 digits".to_string(),
        ));
    }
    if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(EngineError::InvalidAmount(
            "amount must contain only digits".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn normalize_consumer_names(names: &[String]) -> ResultEngine<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidConsumers(
                "consumer names must not be empty".to_string(),
            ));
        }
        if trimmed.chars().count() > 100 {
            return Err(EngineError::InvalidConsumers(
                "consumer names must be at most 100 characters".to_string(),
            ));
        }
        if !normalized.iter().any(|existing| existing == trimmed) {
            normalized.push(trimmed.to_string());
        }
    }
    if normalized.is_empty() || normalized.len() > 20 {
        return Err(EngineError::InvalidConsumers(
            "expected between 1 and 20 distinct consumers".to_string(),
        ));
    }
    Ok(normalized)
}
