use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{ProfileRequest, ProfileView},
    repo::{profile_key, profile_sort, user_partition},
    repo_types::Profile,
};
use crate::{
    database::{DatabaseError, Table},
    error::ServiceError,
};

pub const PROFILE_NOT_FOUND: &str = "Profile not found";

fn backend(op: &'static str) -> impl FnOnce(DatabaseError) -> ServiceError {
    move |e| {
        error!(error = %e, op, "profile store failed");
        ServiceError::from(e)
    }
}

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn Table<Profile>>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn Table<Profile>>) -> Self {
        Self { profiles }
    }

    /// Create or replace the caller's profile. `created_at` survives updates.
    pub async fn put_profile(
        &self,
        user_id: Uuid,
        req: ProfileRequest,
    ) -> Result<ProfileView, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            warn!(%user_id, "empty profile name");
            return Err(ServiceError::validation("Name cannot be empty"));
        }

        let now = OffsetDateTime::now_utc();
        let created_at = self
            .profiles
            .get(&profile_key(user_id))
            .await
            .map_err(backend("get"))?
            .map_or(now, |p| p.created_at);

        let profile = Profile {
            pk: user_partition(user_id),
            sk: profile_sort(user_id),
            user_id,
            name,
            birth_date: req.birth_date,
            gender: req.gender.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            created_at,
            updated_at: now,
        };
        self.profiles
            .write(std::slice::from_ref(&profile))
            .await
            .map_err(backend("write"))?;

        info!(%user_id, "profile saved");
        Ok(profile.into())
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<ProfileView, ServiceError> {
        match self
            .profiles
            .get(&profile_key(user_id))
            .await
            .map_err(backend("get"))?
        {
            Some(p) => Ok(p.into()),
            None => {
                warn!(%user_id, "profile not found");
                Err(ServiceError::not_found(PROFILE_NOT_FOUND))
            }
        }
    }

    pub async fn delete_profile(&self, user_id: Uuid) -> Result<(), ServiceError> {
        self.profiles
            .delete(&profile_key(user_id))
            .await
            .map_err(backend("delete"))?;
        info!(%user_id, "profile deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{KeySchema, MemoryTable, PARTITION_KEY, SORT_KEY};

    fn service() -> ProfileService {
        let table: MemoryTable<Profile> =
            MemoryTable::new(KeySchema::partition(PARTITION_KEY).with_sort(SORT_KEY));
        ProfileService::new(Arc::new(table))
    }

    fn req(name: &str) -> ProfileRequest {
        ProfileRequest {
            name: name.into(),
            birth_date: Some(631_152_000),
            gender: "f".into(),
            email: " A@B.com ".into(),
        }
    }

    #[tokio::test]
    async fn put_then_get() {
        let svc = service();
        let user_id = Uuid::new_v4();
        svc.put_profile(user_id, req("Ada")).await.expect("put");

        let got = svc.get_profile(user_id).await.expect("get");
        assert_eq!(got.user_id, user_id);
        assert_eq!(got.name, "Ada");
        assert_eq!(got.email, "a@b.com");
        assert_eq!(got.birth_date, Some(631_152_000));
    }

    #[tokio::test]
    async fn update_keeps_created_at() {
        let svc = service();
        let user_id = Uuid::new_v4();
        let first = svc.put_profile(user_id, req("Ada")).await.unwrap();
        let second = svc.put_profile(user_id, req("Ada L.")).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(svc.get_profile(user_id).await.unwrap().name, "Ada L.");
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let err = service().get_profile(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err, ServiceError::not_found(PROFILE_NOT_FOUND));
        assert_eq!(err.code().as_u16(), 404);
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let err = service()
            .put_profile(Uuid::new_v4(), req("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let svc = service();
        let user_id = Uuid::new_v4();
        svc.put_profile(user_id, req("Ada")).await.unwrap();
        svc.delete_profile(user_id).await.unwrap();
        svc.delete_profile(user_id).await.unwrap();
        assert!(svc.get_profile(user_id).await.is_err());
    }
}
