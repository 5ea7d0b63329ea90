use crate::application::ports::RemoteRow;
use crate::shared::datetime;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::FromRow;

/// A `deliveries` table row. Recognized columns are typed; anything the
/// schema does not model travels in the `extra` JSONB column so no field is
/// ever dropped on the way through the store.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRow {
    pub id: i64,
    pub user_id: String,
    pub dr_number: String,
    pub customer_name: Option<String>,
    pub vendor_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub truck_type: Option<String>,
    pub truck_plate_number: Option<String>,
    pub distance: Option<String>,
    pub item_number: Option<String>,
    pub item_description: Option<String>,
    pub serial_number: Option<String>,
    pub mobile_number: Option<String>,
    pub status: String,
    pub additional_costs: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_date: Option<String>,
    pub completed_date_time: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub additional_data: Option<String>,
    pub extra: Option<Value>,
}

/// A `customers` table row.
#[derive(Debug, Clone, FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub vendor_number: Option<String>,
    pub contact_person: Option<String>,
    pub extra: Option<Value>,
}

/// Bind-ready column values extracted from a remote-shape map, used by
/// inserts and whole-row updates.
#[derive(Debug, Clone, Default)]
pub struct DeliveryColumns {
    pub user_id: Option<String>,
    pub dr_number: Option<String>,
    pub customer_name: Option<String>,
    pub vendor_number: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub truck_type: Option<String>,
    pub truck_plate_number: Option<String>,
    pub distance: Option<String>,
    pub item_number: Option<String>,
    pub item_description: Option<String>,
    pub serial_number: Option<String>,
    pub mobile_number: Option<String>,
    pub status: String,
    pub additional_costs: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_date: Option<String>,
    pub completed_date_time: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub additional_data: Option<String>,
    pub extra: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerColumns {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile_number: Option<String>,
    pub address: Option<String>,
    pub vendor_number: Option<String>,
    pub contact_person: Option<String>,
    pub extra: Option<Value>,
}

const DELIVERY_COLUMN_NAMES: &[&str] = &[
    "id",
    "user_id",
    "dr_number",
    "customer_name",
    "vendor_number",
    "origin",
    "destination",
    "truck_type",
    "truck_plate_number",
    "distance",
    "item_number",
    "item_description",
    "serial_number",
    "mobile_number",
    "status",
    "additional_costs",
    "created_at",
    "updated_at",
    "last_modified",
    "completed_at",
    "completed_date",
    "completed_date_time",
    "delivery_date",
    "created_date",
    "created_by",
    "additional_data",
];

const CUSTOMER_COLUMN_NAMES: &[&str] = &[
    "id",
    "user_id",
    "name",
    "email",
    "phone",
    "mobile_number",
    "address",
    "vendor_number",
    "contact_person",
];

impl DeliveryRow {
    pub fn into_remote_map(self) -> RemoteRow {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::from(self.id));
        map.insert("user_id".to_string(), Value::from(self.user_id));
        map.insert("dr_number".to_string(), Value::from(self.dr_number));
        insert_opt(&mut map, "customer_name", self.customer_name);
        insert_opt(&mut map, "vendor_number", self.vendor_number);
        insert_opt(&mut map, "origin", self.origin);
        insert_opt(&mut map, "destination", self.destination);
        insert_opt(&mut map, "truck_type", self.truck_type);
        insert_opt(&mut map, "truck_plate_number", self.truck_plate_number);
        insert_opt(&mut map, "distance", self.distance);
        insert_opt(&mut map, "item_number", self.item_number);
        insert_opt(&mut map, "item_description", self.item_description);
        insert_opt(&mut map, "serial_number", self.serial_number);
        insert_opt(&mut map, "mobile_number", self.mobile_number);
        map.insert("status".to_string(), Value::from(self.status));
        map.insert(
            "additional_costs".to_string(),
            Value::from(self.additional_costs),
        );
        insert_instant(&mut map, "created_at", self.created_at);
        insert_instant(&mut map, "updated_at", self.updated_at);
        insert_instant(&mut map, "last_modified", self.last_modified);
        insert_instant(&mut map, "completed_at", self.completed_at);
        insert_opt(&mut map, "completed_date", self.completed_date);
        insert_opt(&mut map, "completed_date_time", self.completed_date_time);
        insert_instant(&mut map, "delivery_date", self.delivery_date);
        insert_instant(&mut map, "created_date", self.created_date);
        insert_opt(&mut map, "created_by", self.created_by);
        insert_opt(&mut map, "additional_data", self.additional_data);
        spread_extra(&mut map, self.extra);
        map
    }
}

impl DeliveryColumns {
    pub fn from_remote_map(row: &RemoteRow) -> Self {
        let mut columns = Self {
            user_id: take_string(row, "user_id"),
            dr_number: take_string(row, "dr_number"),
            customer_name: take_string(row, "customer_name"),
            vendor_number: take_string(row, "vendor_number"),
            origin: take_string(row, "origin"),
            destination: take_string(row, "destination"),
            truck_type: take_string(row, "truck_type"),
            truck_plate_number: take_string(row, "truck_plate_number"),
            distance: take_string(row, "distance"),
            item_number: take_string(row, "item_number"),
            item_description: take_string(row, "item_description"),
            serial_number: take_string(row, "serial_number"),
            mobile_number: take_string(row, "mobile_number"),
            status: take_string(row, "status").unwrap_or_else(|| "On Schedule".to_string()),
            additional_costs: take_cost(row, "additional_costs"),
            created_at: take_instant(row, "created_at"),
            updated_at: take_instant(row, "updated_at"),
            last_modified: take_instant(row, "last_modified"),
            completed_at: take_instant(row, "completed_at"),
            completed_date: take_string(row, "completed_date"),
            completed_date_time: take_string(row, "completed_date_time"),
            delivery_date: take_instant(row, "delivery_date"),
            created_date: take_instant(row, "created_date"),
            created_by: take_string(row, "created_by"),
            additional_data: take_string(row, "additional_data"),
            extra: None,
        };
        columns.extra = collect_extra(row, DELIVERY_COLUMN_NAMES);
        columns
    }
}

impl CustomerRow {
    pub fn into_remote_map(self) -> RemoteRow {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::from(self.id));
        map.insert("user_id".to_string(), Value::from(self.user_id));
        map.insert("name".to_string(), Value::from(self.name));
        insert_opt(&mut map, "email", self.email);
        insert_opt(&mut map, "phone", self.phone);
        insert_opt(&mut map, "mobile_number", self.mobile_number);
        insert_opt(&mut map, "address", self.address);
        insert_opt(&mut map, "vendor_number", self.vendor_number);
        insert_opt(&mut map, "contact_person", self.contact_person);
        spread_extra(&mut map, self.extra);
        map
    }
}

impl CustomerColumns {
    pub fn from_remote_map(row: &RemoteRow) -> Self {
        let mut columns = Self {
            user_id: take_string(row, "user_id"),
            name: take_string(row, "name"),
            email: take_string(row, "email"),
            phone: take_string(row, "phone"),
            mobile_number: take_string(row, "mobile_number"),
            address: take_string(row, "address"),
            vendor_number: take_string(row, "vendor_number"),
            contact_person: take_string(row, "contact_person"),
            extra: None,
        };
        columns.extra = collect_extra(row, CUSTOMER_COLUMN_NAMES);
        columns
    }
}

fn insert_opt(map: &mut RemoteRow, key: &str, value: Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::from(value));
    }
}

fn insert_instant(map: &mut RemoteRow, key: &str, value: Option<DateTime<Utc>>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::from(value.to_rfc3339()));
    }
}

fn spread_extra(map: &mut RemoteRow, extra: Option<Value>) {
    if let Some(Value::Object(fields)) = extra {
        for (key, value) in fields {
            map.entry(key).or_insert(value);
        }
    }
}

fn take_string(row: &RemoteRow, key: &str) -> Option<String> {
    match row.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn take_cost(row: &RemoteRow, key: &str) -> f64 {
    match row.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0).max(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0).max(0.0),
        _ => 0.0,
    }
}

fn take_instant(row: &RemoteRow, key: &str) -> Option<DateTime<Utc>> {
    row.get(key)
        .and_then(Value::as_str)
        .and_then(datetime::parse_flexible)
}

/// Columns the schema does not model end up in the `extra` JSONB column.
fn collect_extra(row: &RemoteRow, known: &[&str]) -> Option<Value> {
    let leftovers: Map<String, Value> = row
        .iter()
        .filter(|(key, _)| !known.contains(&key.as_str()) && key.as_str() != "extra")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if leftovers.is_empty() {
        None
    } else {
        Some(Value::Object(leftovers))
    }
}
