// src/crtsh/types.rs
use serde::{Deserialize, Serialize};

/// Single row from crt.sh's JSON search endpoint
///
/// crt.sh returns more columns than these (`id`, `common_name`,
/// `serial_number`, ...); unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrtShEntry {
    #[serde(default)]
    pub issuer_ca_id: i64,
    #[serde(default)]
    pub issuer_name: String,
    #[serde(default)]
    pub min_cert_id: i64,
    #[serde(default)]
    pub min_entry_timestamp: String,
    /// Newline-joined SAN list
    #[serde(default)]
    pub name_value: String,
    #[serde(default)]
    pub not_after: String,
    #[serde(default)]
    pub not_before: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_crtsh_row() {
        let json = r#"[{
            "issuer_ca_id": 183267,
            "issuer_name": "C=US, O=Let's Encrypt, CN=R3",
            "common_name": "example.com",
            "name_value": "example.com\nwww.example.com",
            "id": 9876543210,
            "entry_timestamp": "2024-05-01T10:11:12.345",
            "not_before": "2024-05-01T09:11:12",
            "not_after": "2024-07-30T09:11:11",
            "serial_number": "04abcdef",
            "min_cert_id": 12345678,
            "min_entry_timestamp": "2024-05-01T10:11:12.345"
        }]"#;

        let rows: Vec<CrtShEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.issuer_ca_id, 183267);
        assert_eq!(row.issuer_name, "C=US, O=Let's Encrypt, CN=R3");
        assert_eq!(row.min_cert_id, 12345678);
        assert_eq!(row.min_entry_timestamp, "2024-05-01T10:11:12.345");
        assert_eq!(row.name_value, "example.com\nwww.example.com");
        assert_eq!(row.not_before, "2024-05-01T09:11:12");
        assert_eq!(row.not_after, "2024-07-30T09:11:11");
    }

    #[test]
    fn test_deserialize_row_with_missing_fields() {
        let json = r#"{"name_value": "a.example.com"}"#;
        let row: CrtShEntry = serde_json::from_str(json).unwrap();

        assert_eq!(row.name_value, "a.example.com");
        assert_eq!(row.issuer_ca_id, 0);
        assert!(row.not_after.is_empty());
    }

    #[test]
    fn test_deserialize_object_instead_of_array_fails() {
        let json = r#"{"error": "rate limited"}"#;
        let result: Result<Vec<CrtShEntry>, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
