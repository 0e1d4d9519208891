use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};
use time::macros::format_description;
use time::Date;

mod redact;
mod status;

pub use redact::{display_key, redact_key, REDACTION_CHAR};
pub use status::{ExpiryStatus, StatusKind, EXPIRING_WINDOW_DAYS, WARNING_WINDOW_DAYS};

// expiry_date stays raw so a malformed value loads as ExpiryStatus::Unknown
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    #[serde(deserialize_with = "id_from_scalar")]
    pub id: String,
    pub product_name: String,
    pub vendor: String,
    pub license_key: String,
    pub expiry_date: String,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LicenseRecord {
    pub fn expiry(&self) -> Option<Date> {
        parse_date(&self.expiry_date)
    }

    pub fn days_until_expiry(&self, today: Date) -> Option<i64> {
        self.expiry().map(|expiry| (expiry - today).whole_days())
    }

    pub fn status(&self, today: Date) -> ExpiryStatus {
        ExpiryStatus::derive(self.days_until_expiry(today))
    }

    pub fn display_key(&self, show_keys: bool) -> Cow<'_, str> {
        display_key(&self.license_key, show_keys)
    }

    // needle is already lowercased
    pub fn matches_search(&self, needle: &str) -> bool {
        let contains = |value: &str| value.to_lowercase().contains(needle);
        contains(&self.product_name)
            || contains(&self.vendor)
            || self.department.as_deref().is_some_and(contains)
            || self.category.as_deref().is_some_and(contains)
    }
}

pub fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}

fn id_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(i64),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn record() -> LicenseRecord {
        LicenseRecord {
            id: "7".into(),
            product_name: "Figma Organization".into(),
            vendor: "Figma".into(),
            license_key: "AB12C-99ZZ1-7777".into(),
            expiry_date: "2024-07-01".into(),
            notes: None,
            department: Some("Product Design".into()),
            category: None,
        }
    }

    #[test]
    fn parses_calendar_dates_only() {
        assert_eq!(parse_date("2024-06-30"), Some(date!(2024 - 06 - 30)));
        assert_eq!(parse_date(" 2025-03-15 "), Some(date!(2025 - 03 - 15)));
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn days_until_expiry_is_signed() {
        let license = record();
        assert_eq!(license.days_until_expiry(date!(2024 - 06 - 01)), Some(30));
        assert_eq!(license.days_until_expiry(date!(2024 - 07 - 01)), Some(0));
        assert_eq!(license.days_until_expiry(date!(2024 - 07 - 03)), Some(-2));
    }

    #[test]
    fn malformed_expiry_has_no_day_count() {
        let mut license = record();
        license.expiry_date = "31/12/2024".into();
        assert_eq!(license.days_until_expiry(date!(2024 - 06 - 01)), None);
        assert_eq!(license.status(date!(2024 - 06 - 01)), ExpiryStatus::Unknown);
    }

    #[test]
    fn search_covers_name_vendor_department_and_category() {
        let mut license = record();
        assert!(license.matches_search("organization"));
        assert!(license.matches_search("figma"));
        assert!(license.matches_search("design"));
        assert!(!license.matches_search("marketing"));

        license.category = Some("Collaboration".into());
        assert!(license.matches_search("collab"));
    }

    #[test]
    fn deserializes_camel_case_and_blank_optionals() -> anyhow::Result<()> {
        let raw = r#"{
            "id": "9",
            "productName": "Zoom Business",
            "vendor": "Zoom",
            "licenseKey": "11111-22222",
            "expiryDate": "2025-01-31",
            "notes": "",
            "department": "Sales"
        }"#;
        let license: LicenseRecord = serde_json::from_str(raw)?;
        assert_eq!(license.product_name, "Zoom Business");
        assert_eq!(license.notes, None);
        assert_eq!(license.department.as_deref(), Some("Sales"));
        assert_eq!(license.category, None);

        let encoded = serde_json::to_value(&license)?;
        assert_eq!(encoded["licenseKey"], "11111-22222");
        assert!(encoded.get("notes").is_none());

        let numeric: LicenseRecord = serde_json::from_str(
            r#"{"id":12,"productName":"A","vendor":"B","licenseKey":"K","expiryDate":"2025-01-01"}"#,
        )?;
        assert_eq!(numeric.id, "12");
        assert_eq!(serde_json::to_value(&numeric)?["id"], "12");
        Ok(())
    }
}
