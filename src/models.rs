use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = vessels)]
pub struct Vessel {
    pub id: i64,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = vessels)]
pub struct NewVessel {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = equipments)]
#[diesel(belongs_to(Vessel))]
pub struct Equipment {
    pub id: i64,
    pub vessel_id: i64,
    pub name: String,
    pub code: String,
    pub location: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = equipments)]
pub struct NewEquipment {
    pub vessel_id: i64,
    pub name: String,
    pub code: String,
    pub location: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = operations)]
#[diesel(belongs_to(Equipment))]
pub struct Operation {
    pub id: i64,
    pub equipment_id: i64,
    pub type_: String,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = operations)]
pub struct NewOperation {
    pub equipment_id: i64,
    pub type_: String,
    pub cost: f64,
}

/// Row filter for equipment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EquipmentFilter {
    #[default]
    All,
    Active,
}

/// Equipment key used when summing operation costs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostFilter {
    Code(String),
    Name(String),
}
