//! GHN administrative locations.
//!
//! GHN's master-data endpoints return PascalCase records (`ProvinceID`,
//! `DistrictName`, `WardCode`, ...). They are normalized into small typed
//! records here; entries lacking an id or a name are dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub id: i64,
    pub name: String,
    pub province_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub code: String,
    pub name: String,
    pub district_id: Option<i64>,
}

fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| record.get(*k).filter(|v| !v.is_null()))
}

fn int_field(record: &Value, keys: &[&str]) -> Option<i64> {
    match field(record, keys)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(record: &Value, keys: &[&str]) -> Option<String> {
    match field(record, keys)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// GHN responses are either a bare array or wrapped in `{ "data": [...] }`.
fn records(payload: &Value) -> &[Value] {
    match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    }
}

/// Normalize a province list.
pub fn normalize_provinces(payload: &Value) -> Vec<Province> {
    records(payload)
        .iter()
        .filter_map(|r| {
            Some(Province {
                id: int_field(r, &["ProvinceID", "provinceId", "id"])?,
                name: text_field(r, &["ProvinceName", "provinceName", "name"])?,
            })
        })
        .collect()
}

/// Normalize a district list.
pub fn normalize_districts(payload: &Value) -> Vec<District> {
    records(payload)
        .iter()
        .filter_map(|r| {
            Some(District {
                id: int_field(r, &["DistrictID", "districtId", "id"])?,
                name: text_field(r, &["DistrictName", "districtName", "name"])?,
                province_id: int_field(r, &["ProvinceID", "provinceId"]),
            })
        })
        .collect()
}

/// Normalize a ward list.
pub fn normalize_wards(payload: &Value) -> Vec<Ward> {
    records(payload)
        .iter()
        .filter_map(|r| {
            Some(Ward {
                code: text_field(r, &["WardCode", "wardCode", "code"])?,
                name: text_field(r, &["WardName", "wardName", "name"])?,
                district_id: int_field(r, &["DistrictID", "districtId"]),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_provinces() {
        let payload = json!([
            {"ProvinceID": 202, "ProvinceName": "Hồ Chí Minh"},
            {"ProvinceID": 201, "ProvinceName": ""},
            {"ProvinceName": "No id"},
            {"ProvinceID": "203", "ProvinceName": "Đà Nẵng"}
        ]);
        let provinces = normalize_provinces(&payload);
        assert_eq!(
            provinces,
            vec![
                Province { id: 202, name: "Hồ Chí Minh".into() },
                Province { id: 203, name: "Đà Nẵng".into() },
            ]
        );
    }

    #[test]
    fn test_normalize_districts_wrapped() {
        let payload = json!({"code": 200, "data": [
            {"DistrictID": 1442, "DistrictName": "Quận 1", "ProvinceID": 202},
            {"DistrictID": null, "DistrictName": "Broken"}
        ]});
        let districts = normalize_districts(&payload);
        assert_eq!(districts.len(), 1);
        assert_eq!(districts[0].province_id, Some(202));
    }

    #[test]
    fn test_normalize_wards() {
        let payload = json!([
            {"WardCode": "20109", "WardName": "Bến Nghé", "DistrictID": 1442},
            {"WardCode": 20110, "WardName": "Bến Thành"},
            {"WardName": "No code"}
        ]);
        let wards = normalize_wards(&payload);
        assert_eq!(wards.len(), 2);
        assert_eq!(wards[1].code, "20110");
        assert_eq!(wards[1].district_id, None);
    }

    #[test]
    fn test_non_list_payload_is_empty() {
        assert!(normalize_wards(&json!("oops")).is_empty());
        assert!(normalize_provinces(&json!({"data": null})).is_empty());
    }
}
