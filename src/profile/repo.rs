use uuid::Uuid;

use crate::database::{Key, PARTITION_KEY, SORT_KEY};

pub const USER_PREFIX: &str = "USER";
pub const PROFILE_PREFIX: &str = "PROFILE";

/// `USER#<id>`, the partition that groups everything a user owns.
pub fn user_partition(user_id: impl std::fmt::Display) -> String {
    format!("{USER_PREFIX}#{user_id}")
}

pub fn profile_sort(user_id: Uuid) -> String {
    format!("{PROFILE_PREFIX}#{user_id}")
}

pub fn profile_key(user_id: Uuid) -> Key {
    Key::partition(PARTITION_KEY, user_partition(user_id))
        .with_sort(SORT_KEY, profile_sort(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_key_shape() {
        let id = Uuid::new_v4();
        let key = profile_key(id);
        assert_eq!(key.partition.value, format!("USER#{id}"));
        assert_eq!(key.sort.unwrap().value, format!("PROFILE#{id}"));
    }
}
