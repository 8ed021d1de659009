//! Asset record entity (technician store-visit submissions).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One equipment line in a store-visit submission.
///
/// Invariant: `is_present == false` implies `count == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentEntry {
    /// Equipment name.
    pub name: String,
    /// Whether the equipment was found on site.
    pub is_present: bool,
    /// How many units were found.
    pub count: u32,
}

/// Asset record model. Created once per store visit; never edited.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Technician who made the visit.
    pub technician_id: String,

    pub store_name: String,

    /// Calendar date of the visit.
    pub submission_date: Date,

    /// Equipment inventory (JSON array of [`EquipmentEntry`]).
    pub equipment: Json,

    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed equipment list. An unreadable column yields an empty list.
    #[must_use]
    pub fn equipment_entries(&self) -> Vec<EquipmentEntry> {
        serde_json::from_value(self.equipment.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
