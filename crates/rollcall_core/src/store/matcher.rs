//! Row-to-record matching used when persisting sign-ins.

use crate::model::record::{decode_name, SignOutRecord};

/// Returns whether a stored row identifies `record`.
///
/// Exact string equality on the decoded name and the phone. No case or
/// whitespace normalization: `smith` does not match `Smith`.
pub fn matches(stored_name: &str, stored_phone: &str, record: &SignOutRecord) -> bool {
    stored_phone == record.phone && decode_name(stored_name) == record.name
}

#[cfg(test)]
mod tests {
    use super::matches;
    use crate::model::record::SignOutRecord;
    use chrono::NaiveTime;

    fn record(name: &str, phone: &str) -> SignOutRecord {
        SignOutRecord::new(name, "PX", phone, NaiveTime::from_hms_opt(9, 0, 0).unwrap())
    }

    #[test]
    fn decoded_name_and_phone_must_both_match() {
        let target = record("Doe, Jane", "555-0100");
        assert!(matches("Doe%Jane", "555-0100", &target));
        assert!(!matches("Doe%Jane", "555-0101", &target));
        assert!(!matches("Doe%John", "555-0100", &target));
    }

    #[test]
    fn matching_is_case_and_whitespace_sensitive() {
        let target = record("Smith", "555");
        assert!(!matches("smith", "555", &target));
        assert!(!matches("Smith ", "555", &target));
        assert!(!matches("Smith", " 555", &target));
    }
}
