//! Helpers for mutating statements that hand rows back.
//!
//! Soft-delete flips and guarded updates run as raw `UPDATE ... RETURNING`
//! statements. These helpers map the returned rows onto typed models and turn
//! "matched nothing" into an error the caller names.

use sea_orm::{DatabaseTransaction, FromQueryResult, Statement};

use crate::{EngineError, ResultEngine};

/// Runs a statement expected to touch exactly one row.
///
/// When no row comes back the caller-supplied message is returned as
/// [`EngineError::NoEffect`].
pub(crate) async fn one<M>(
    db_tx: &DatabaseTransaction,
    stmt: Statement,
    no_effect: &str,
) -> ResultEngine<M>
where
    M: FromQueryResult,
{
    M::find_by_statement(stmt)
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NoEffect(no_effect.to_string()))
}

/// Runs a statement that may touch any number of rows.
///
/// With a message, zero returned rows is an error. With `None` an empty
/// result is fine, which is what bulk flips over an empty set want.
pub(crate) async fn many<M>(
    db_tx: &DatabaseTransaction,
    stmt: Statement,
    no_effect: Option<&str>,
) -> ResultEngine<Vec<M>>
where
    M: FromQueryResult,
{
    let rows = M::find_by_statement(stmt).all(db_tx).await?;
    if rows.is_empty() {
        if let Some(message) = no_effect {
            return Err(EngineError::NoEffect(message.to_string()));
        }
    }
    Ok(rows)
}
