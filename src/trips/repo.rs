use uuid::Uuid;

use crate::database::{Filter, Key, KeyCondition, PARTITION_KEY, SORT_KEY};

pub use crate::profile::repo::{user_partition, USER_PREFIX};

pub const TRIP_PREFIX: &str = "TRIP";

pub fn trip_partition(trip_id: Uuid) -> String {
    format!("{TRIP_PREFIX}#{trip_id}")
}

/// Primary trip record: PK = SK = `TRIP#<id>`.
pub fn trip_key(trip_id: Uuid) -> Key {
    let id = trip_partition(trip_id);
    Key::partition(PARTITION_KEY, id.clone()).with_sort(SORT_KEY, id)
}

/// Trips listed under a user's partition.
pub fn trips_of_user(user_id: impl std::fmt::Display) -> KeyCondition {
    KeyCondition::partition(PARTITION_KEY, user_partition(user_id))
        .sort_begins_with(SORT_KEY, TRIP_PREFIX)
}

/// Index lookup for every record whose sort key is the trip, narrowed to
/// user-owned partitions.
pub fn trip_members(trip_id: Uuid) -> (KeyCondition, Filter) {
    (
        KeyCondition::partition(SORT_KEY, trip_partition(trip_id)),
        Filter::begins_with(PARTITION_KEY, USER_PREFIX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_key_repeats_the_id() {
        let id = Uuid::new_v4();
        let key = trip_key(id);
        assert_eq!(key.partition.value, format!("TRIP#{id}"));
        assert_eq!(key.sort.unwrap().value, format!("TRIP#{id}"));
    }

    #[test]
    fn user_listing_uses_sort_prefix() {
        assert_eq!(
            trips_of_user("42"),
            KeyCondition::partition("PK", "USER#42").sort_begins_with("SK", "TRIP")
        );
    }
}
