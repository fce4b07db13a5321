use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Multi-language descriptions attached to bank cards.
pub struct BankMlDescriptions;

impl Entity for BankMlDescriptions {
    const PATH: &'static str = "bankMLDescriptions";
    type Record = BankMlDescription;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct BankMlDescription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_ref: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_unmodelled_fields() {
        let raw = r#"{"INTERNAL_REFERENCE":4,"TITLE":"Hauptbank","LANGUAGE":2,"LINE_NR":1}"#;
        let record: BankMlDescription = serde_json::from_str(raw).unwrap();
        assert_eq!(record.internal_reference, Some(4));
        assert_eq!(record.language, Some(2));
        assert_eq!(record.extra["LINE_NR"], 1);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(raw).unwrap());
    }
}
