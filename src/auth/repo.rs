use crate::database::{Key, PARTITION_KEY};

/// Accounts are keyed by the raw (normalized) email with no sort key.
pub fn account_key(email: &str) -> Key {
    Key::partition(PARTITION_KEY, email)
}
