// Normalization - Raw backend records into domain readings
use super::color::ColorSource;
use super::fields::{
    RawRecord, resolve, resolve_display, resolve_optional_number, resolve_number, resolve_text,
};
use super::reading::{HistoricalReading, Site, TankReading};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

pub const SITE_ID_FIELDS: &[&str] = &[
    "siteId", "almacen_id", "almacen", "CODALMA", "IDALMA", "COD_ALM",
];
pub const SITE_NAME_FIELDS: &[&str] = &["siteName", "almacen_nombre", "nombre_almacen", "POBLACION"];
pub const TANK_ID_FIELDS: &[&str] = &["tankId", "tanque_id", "tanque", "TANQUE"];
pub const TANK_CODE_FIELDS: &[&str] = &["tankCode", "tanque_codigo", "codigo"];
pub const TANK_NAME_FIELDS: &[&str] = &["displayName", "tanque_nombre", "nombre", "DESCRI"];
pub const PRODUCT_ID_FIELDS: &[&str] = &["productId", "producto", "articulo"];
pub const PRODUCT_NAME_FIELDS: &[&str] = &["productName", "producto_nombre", "articulo_nombre"];
pub const CAPACITY_FIELDS: &[&str] = &["capacityLiters", "capacidad_l", "capacidad"];
pub const VOLUME_FIELDS: &[&str] = &["volumeLiters", "stock_l", "volumen", "litros"];
pub const VOLUME_15C_FIELDS: &[&str] = &["volume15Liters", "litros15", "stock15_l"];
pub const TEMPERATURE_FIELDS: &[&str] = &["temperatureC", "temp_ultima_c", "temperatura", "TEMPERA"];
pub const HEX_COLOR_FIELDS: &[&str] = &["colorHex", "color_hex", "producto_color", "color"];
/// Product-table colors stored as a packed integer, sometimes serialized as digits.
pub const PACKED_COLOR_FIELDS: &[&str] = &["colorPacked", "COLORPRODU"];
pub const TIMESTAMP_FIELDS: &[&str] = &["lastReadingTimestamp", "timestamp", "ultima_lectura", "dt", "fecha"];

pub const SITE_RECORD_ID_FIELDS: &[&str] = &["siteId", "id", "codigo", "almacen_id", "almacen", "COD_ALM"];
pub const SITE_RECORD_NAME_FIELDS: &[&str] = &["siteName", "nombre", "name", "POBLACION"];

/// Envelope keys tried, in order, when a response is an object instead of a bare array.
pub const TANK_ENVELOPES: &[&str] = &["rows", "tanques", "tanks", "data"];
pub const SITE_ENVELOPES: &[&str] = &["rows", "almacenes", "sites", "data"];
pub const HISTORY_ENVELOPES: &[&str] = &["rows", "historico", "history", "data"];

/// Extract the record list from a bare array or a `{key: [...]}` envelope.
///
/// Returns `None` when the payload has neither shape. Non-object items are dropped.
pub fn unwrap_rows(payload: Value, envelopes: &[&str]) -> Option<Vec<RawRecord>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let key = envelopes
                .iter()
                .find(|key| map.get(**key).map(Value::is_array).unwrap_or(false))?;
            match map.remove(*key) {
                Some(Value::Array(items)) => items,
                _ => return None,
            }
        }
        _ => return None,
    };

    let total = items.len();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect();
    if records.len() != total {
        tracing::warn!(
            "Dropped {} non-object rows out of {}",
            total - records.len(),
            total
        );
    }
    Some(records)
}

pub fn normalize_tank(record: &RawRecord) -> TankReading {
    let color_source = ColorSource {
        hex: hex_color(record),
        packed: packed_color(record),
    };

    TankReading {
        site_id: resolve_text(record, SITE_ID_FIELDS),
        site_name: non_blank(resolve_display(record, SITE_NAME_FIELDS, "")),
        tank_id: resolve_text(record, TANK_ID_FIELDS),
        code: resolve_text(record, TANK_CODE_FIELDS),
        display_name: resolve_text(record, TANK_NAME_FIELDS),
        product_id: resolve_text(record, PRODUCT_ID_FIELDS),
        product_name: non_blank(resolve_display(record, PRODUCT_NAME_FIELDS, "")),
        capacity_liters: resolve_number(record, CAPACITY_FIELDS, 0.0).max(0.0),
        volume_liters: resolve_number(record, VOLUME_FIELDS, 0.0),
        volume_15c_liters: resolve_optional_number(record, VOLUME_15C_FIELDS),
        temperature_c: resolve_optional_number(record, TEMPERATURE_FIELDS),
        color_source,
        last_reading: non_blank(resolve_display(record, TIMESTAMP_FIELDS, "")),
    }
}

/// First non-blank color string, skipping digit-only text in packed fields.
fn hex_color(record: &RawRecord) -> Option<String> {
    let hex_fields = HEX_COLOR_FIELDS.iter().map(|f| (*f, false));
    let packed_fields = PACKED_COLOR_FIELDS.iter().map(|f| (*f, true));
    hex_fields.chain(packed_fields).find_map(|(field, packed)| {
        match resolve(record, &[field]) {
            Some(Value::String(text)) if !text.trim().is_empty() => {
                let text = text.trim();
                (!(packed && is_digits(text))).then(|| text.to_string())
            }
            _ => None,
        }
    })
}

/// First numeric color, or digit-only text in a packed field.
fn packed_color(record: &RawRecord) -> Option<i64> {
    let packed_fields = PACKED_COLOR_FIELDS.iter().map(|f| (*f, true));
    let hex_fields = HEX_COLOR_FIELDS.iter().map(|f| (*f, false));
    packed_fields.chain(hex_fields).find_map(|(field, packed)| {
        match resolve(record, &[field]) {
            Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(Value::String(text)) if packed && is_digits(text.trim()) => text.trim().parse().ok(),
            _ => None,
        }
    })
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Site records without any identifying field are skipped.
pub fn normalize_site(record: &RawRecord) -> Option<Site> {
    let id = resolve_display(record, SITE_RECORD_ID_FIELDS, "");
    if id.is_empty() {
        return None;
    }
    let name = resolve_display(record, SITE_RECORD_NAME_FIELDS, "");
    Some(Site::new(id, name))
}

pub fn normalize_history(record: &RawRecord) -> HistoricalReading {
    let raw_timestamp = non_blank(resolve_display(record, TIMESTAMP_FIELDS, ""));
    HistoricalReading {
        timestamp: raw_timestamp.as_deref().and_then(parse_timestamp),
        raw_timestamp,
        volume_liters: resolve_optional_number(record, VOLUME_FIELDS),
        volume_15c_liters: resolve_optional_number(record, VOLUME_15C_FIELDS),
        temperature_c: resolve_optional_number(record, TEMPERATURE_FIELDS),
    }
}

/// RFC 3339, RFC 2822 (Flask's default), or a naive ISO datetime taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn non_blank(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
