//! Shipping addresses.

use crate::error::CommerceError;
use crate::ids::AddressId;
use serde::{Deserialize, Deserializer, Serialize};

/// A saved address from `/addresses`.
///
/// GHN location keys keep the backend's casing (`provinceID`, `districtID`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default, alias = "recipientPhone", alias = "phone")]
    pub recipient_phone_number: String,
    #[serde(default)]
    pub province_name: Option<String>,
    #[serde(default, rename = "provinceID", deserialize_with = "loose_key")]
    pub province_id: Option<String>,
    #[serde(default)]
    pub district_name: Option<String>,
    #[serde(default, rename = "districtID", deserialize_with = "loose_key")]
    pub district_id: Option<String>,
    #[serde(default)]
    pub ward_name: Option<String>,
    #[serde(default, deserialize_with = "loose_key")]
    pub ward_code: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub default_address: bool,
}

/// Location keys come back as strings or numbers; blank means absent.
fn loose_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl Address {
    /// Street, ward, district and province joined by `", "`, skipping blanks.
    pub fn full_address(&self) -> String {
        [
            non_blank(Some(&self.address)),
            non_blank(self.ward_name.as_deref()),
            non_blank(self.district_name.as_deref()),
            non_blank(self.province_name.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// GHN district id as a number, if it parses.
    pub fn ghn_district_id(&self) -> Option<i64> {
        self.district_id.as_deref()?.trim().parse().ok()
    }

    /// GHN ward code, if present.
    pub fn ghn_ward_code(&self) -> Option<&str> {
        non_blank(self.ward_code.as_deref())
    }

    /// Whether GHN can quote a fee for this address.
    pub fn is_ghn_routable(&self) -> bool {
        self.ghn_ward_code().is_some() && self.ghn_district_id().is_some()
    }

    /// Whether the address has everything an order needs.
    pub fn has_shipping_info(&self) -> bool {
        non_blank(Some(&self.recipient_name)).is_some()
            && non_blank(Some(&self.recipient_phone_number)).is_some()
            && non_blank(Some(&self.address)).is_some()
            && self.ghn_ward_code().is_some()
            && non_blank(self.district_id.as_deref()).is_some()
    }

    /// The `{name, phone, address}` triple sent with an order.
    pub fn shipping_info(&self) -> ShippingInfo {
        ShippingInfo {
            name: self.recipient_name.trim().to_string(),
            phone: self.recipient_phone_number.trim().to_string(),
            address: self.full_address(),
        }
    }
}

/// Recipient block embedded (as a JSON string) in checkout requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl ShippingInfo {
    /// Encode as the JSON string the order endpoints expect.
    pub fn to_json_string(&self) -> Result<String, CommerceError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Body for creating or updating an address.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPayload {
    pub recipient_name: String,
    pub recipient_phone_number: String,
    pub province_name: String,
    #[serde(rename = "provinceID")]
    pub province_id: String,
    pub district_name: String,
    #[serde(rename = "districtID")]
    pub district_id: String,
    pub ward_name: String,
    pub ward_code: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub default_address: bool,
}

impl AddressPayload {
    /// Trim every field.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.recipient_name,
            &mut self.recipient_phone_number,
            &mut self.province_name,
            &mut self.province_id,
            &mut self.district_name,
            &mut self.district_id,
            &mut self.ward_name,
            &mut self.ward_code,
            &mut self.address,
        ] {
            *field = field.trim().to_string();
        }
        self.postal_code = self
            .postal_code
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self
    }

    /// Trim and check that the required fields are filled in.
    pub fn validate(self) -> Result<Self, CommerceError> {
        let payload = self.normalized();
        let required = [
            ("recipient name", &payload.recipient_name),
            ("phone number", &payload.recipient_phone_number),
            ("province", &payload.province_id),
            ("district", &payload.district_id),
            ("ward", &payload.ward_code),
            ("street address", &payload.address),
        ];
        if let Some((name, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(CommerceError::InvalidAddress(format!("{name} is required")));
        }
        let digits = payload
            .recipient_phone_number
            .chars()
            .filter(char::is_ascii_digit)
            .count();
        if !(9..=11).contains(&digits) {
            return Err(CommerceError::InvalidAddress(
                "phone number must have 9 to 11 digits".to_string(),
            ));
        }
        Ok(payload)
    }
}

impl From<&Address> for AddressPayload {
    fn from(a: &Address) -> Self {
        Self {
            recipient_name: a.recipient_name.clone(),
            recipient_phone_number: a.recipient_phone_number.clone(),
            province_name: a.province_name.clone().unwrap_or_default(),
            province_id: a.province_id.clone().unwrap_or_default(),
            district_name: a.district_name.clone().unwrap_or_default(),
            district_id: a.district_id.clone().unwrap_or_default(),
            ward_name: a.ward_name.clone().unwrap_or_default(),
            ward_code: a.ward_code.clone().unwrap_or_default(),
            address: a.address.clone(),
            postal_code: a.postal_code.clone(),
            default_address: a.default_address,
        }
    }
}

/// Pick the address a checkout starts with: the default one, else the first.
pub fn pick_default_address(addresses: &[Address]) -> Option<&Address> {
    addresses
        .iter()
        .find(|a| a.default_address)
        .or_else(|| addresses.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        serde_json::from_str(
            r#"{
                "id": 1,
                "recipientName": "Tran Thi B",
                "recipientPhoneNumber": "0912345678",
                "provinceName": "Ho Chi Minh",
                "provinceID": 202,
                "districtName": "Quan 1",
                "districtID": "1442",
                "wardName": "Ben Nghe",
                "wardCode": "20109",
                "address": " 12 Le Loi ",
                "defaultAddress": true
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_full_address() {
        assert_eq!(
            address().full_address(),
            "12 Le Loi, Ben Nghe, Quan 1, Ho Chi Minh"
        );

        let mut a = address();
        a.ward_name = Some("  ".into());
        a.district_name = None;
        assert_eq!(a.full_address(), "12 Le Loi, Ho Chi Minh");
    }

    #[test]
    fn test_ghn_keys() {
        let a = address();
        assert_eq!(a.province_id.as_deref(), Some("202"));
        assert_eq!(a.ghn_district_id(), Some(1442));
        assert!(a.is_ghn_routable());

        let mut a = address();
        a.district_id = Some("Q1".into());
        assert!(!a.is_ghn_routable());
    }

    #[test]
    fn test_has_shipping_info() {
        assert!(address().has_shipping_info());

        let mut a = address();
        a.recipient_phone_number = " ".into();
        assert!(!a.has_shipping_info());

        let mut a = address();
        a.ward_code = None;
        assert!(!a.has_shipping_info());
    }

    #[test]
    fn test_shipping_info_json() {
        let info = address().shipping_info();
        let json = info.to_json_string().unwrap();
        assert!(json.contains("\"name\":\"Tran Thi B\""));
        assert!(json.contains("\"phone\":\"0912345678\""));
    }

    #[test]
    fn test_payload_validate() {
        let payload = AddressPayload::from(&address()).validate().unwrap();
        assert_eq!(payload.address, "12 Le Loi");

        let mut bad = AddressPayload::from(&address());
        bad.ward_code = "  ".into();
        assert!(matches!(bad.validate(), Err(CommerceError::InvalidAddress(_))));

        let mut bad = AddressPayload::from(&address());
        bad.recipient_phone_number = "123".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_pick_default() {
        let mut other = address();
        other.id = AddressId::new("2");
        other.default_address = false;
        let list = vec![other.clone(), address()];
        assert_eq!(pick_default_address(&list).unwrap().id.as_str(), "1");
        assert_eq!(pick_default_address(&[other]).unwrap().id.as_str(), "2");
        assert!(pick_default_address(&[]).is_none());
    }
}
