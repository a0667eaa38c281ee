//! Bill primitives.
//!
//! A `Bill` is one recorded expense: an integral amount paid to a receiver at
//! a location, split over one to twenty consumers. The row keeps foreign keys;
//! the domain type carries the resolved references.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Consumer, Lifecycle, Location, Receiver, consumers, locations, receivers};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: i64,
    pub amount: String,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub user_id: i64,
    pub receiver: Receiver,
    pub location: Location,
    pub consumers: Vec<Consumer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

impl Bill {
    /// Builds the domain bill from its row and the rows it references.
    ///
    /// Consumers come back sorted by name so two loads of the same bill
    /// compare equal regardless of join order.
    pub(crate) fn from_parts(
        bill: Model,
        receiver: receivers::Model,
        location: locations::Model,
        mut consumers: Vec<consumers::Model>,
    ) -> Self {
        consumers.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            id: bill.id,
            amount: bill.amount,
            description: bill.description,
            date: bill.date,
            user_id: bill.user_id,
            receiver: Receiver::from(receiver),
            location: Location::from(location),
            consumers: consumers.into_iter().map(Consumer::from).collect(),
            created_at: bill.created_at,
            updated_at: bill.updated_at,
            lifecycle: Lifecycle::from_deleted_at(bill.deleted_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub amount: String,
    pub description: String,
    pub date: Option<DateTimeUtc>,
    pub user_id: i64,
    pub receiver_id: i32,
    pub location_id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::receivers::Entity",
        from = "Column::ReceiverId",
        to = "super::receivers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Receivers,
    #[sea_orm(
        belongs_to = "super::locations::Entity",
        from = "Column::LocationId",
        to = "super::locations::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Locations,
}

impl Related<super::consumers::Entity> for Entity {
    fn to() -> RelationDef {
        super::bill_consumers::Relation::Consumers.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::bill_consumers::Relation::Bills.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
