//! Unique blob name generation.

use uuid::Uuid;

use crate::time;
use crate::time::DateTime;

/// Timestamp prefix format: `03-01-2024 12:00:00`
///
/// UTC is used here on purpose: SAS expiry is computed in UTC, and mixing
/// time bases for naming and policy was a latent bug in earlier designs.
const BLOB_NAME_TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

const BLOB_NAME_EXTENSION: &str = ".jpg";

/// Generate a unique, sortable blob name:
/// `<UTC timestamp>_<random uuid>.jpg`
///
/// Uniqueness is probabilistic (UUID v4 collision space), not coordinated.
pub fn unique_blob_name() -> String {
    blob_name_at(time::now())
}

fn blob_name_at(t: DateTime) -> String {
    format!(
        "{}_{}{}",
        t.format(BLOB_NAME_TIMESTAMP_FORMAT),
        Uuid::new_v4(),
        BLOB_NAME_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDateTime;

    use super::*;

    #[test]
    fn test_blob_name_structure() {
        let t = DateTime::from_str("2024-03-01T12:00:00Z").unwrap();
        let name = blob_name_at(t);

        let stem = name.strip_suffix(BLOB_NAME_EXTENSION).expect("extension");
        let (timestamp, id) = stem.rsplit_once('_').expect("separator");

        assert_eq!(timestamp, "03-01-2024 12:00:00");
        assert!(
            NaiveDateTime::parse_from_str(timestamp, BLOB_NAME_TIMESTAMP_FORMAT).is_ok(),
            "timestamp must round-trip: {timestamp}"
        );
        assert!(Uuid::from_str(id).is_ok(), "uuid must parse: {id}");
    }

    #[test]
    fn test_blob_names_are_unique() {
        let t = DateTime::from_str("2024-03-01T12:00:00Z").unwrap();
        // Same instant, different random component.
        assert_ne!(blob_name_at(t), blob_name_at(t));
    }
}
