use std::sync::Arc;

use tracing::info;

use crate::{
    auth::{repo_types::Account, AuthService, JwtKeys},
    config::{AppConfig, DatabaseBackend},
    database::{self, DynamoTable, KeySchema, MemoryTable, PARTITION_KEY, SORT_KEY},
    profile::{repo_types::Profile, ProfileService},
    trips::{repo_types::Trip, TripService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub auth: AuthService,
    pub profiles: ProfileService,
    pub trips: TripService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        match config.dynamo.backend {
            DatabaseBackend::Dynamodb => Self::dynamodb(config).await,
            DatabaseBackend::Memory => {
                info!("using in-memory tables; data is lost on exit");
                Ok(Self::in_memory(config))
            }
        }
    }

    async fn dynamodb(config: AppConfig) -> anyhow::Result<Self> {
        let client = database::connect(&config.dynamo).await?;
        let accounts = DynamoTable::<Account>::new(client.clone(), &config.dynamo.auth_table);
        let application = &config.dynamo.application_table;
        let profiles = DynamoTable::<Profile>::new(client.clone(), application);
        let trips = DynamoTable::<Trip>::new(client, application);
        info!(
            region = %config.dynamo.region,
            endpoint = config.dynamo.endpoint.as_deref().unwrap_or("default"),
            auth_table = accounts.table_name(),
            application_table = trips.table_name(),
            "connected to dynamodb"
        );

        Ok(Self::from_parts(
            config,
            Arc::new(accounts),
            Arc::new(profiles),
            Arc::new(trips),
        ))
    }

    /// Tables kept in process, shaped like the DynamoDB tables.
    pub fn in_memory(config: AppConfig) -> Self {
        let accounts = MemoryTable::<Account>::new(KeySchema::partition(PARTITION_KEY));
        let application = MemoryTable::<Trip>::new(
            KeySchema::partition(PARTITION_KEY).with_sort(SORT_KEY),
        )
        .with_index(
            config.dynamo.application_index.clone(),
            KeySchema::partition(SORT_KEY).with_sort(PARTITION_KEY),
        );
        let profiles = application.share::<Profile>();

        Self::from_parts(
            config,
            Arc::new(accounts),
            Arc::new(profiles),
            Arc::new(application),
        )
    }

    pub fn from_parts(
        config: AppConfig,
        accounts: Arc<dyn database::Table<Account>>,
        profiles: Arc<dyn database::Table<Profile>>,
        trips: Arc<dyn database::Table<Trip>>,
    ) -> Self {
        let keys = JwtKeys::from(&config.jwt);
        let index = config.dynamo.application_index.clone();
        Self {
            config: Arc::new(config),
            auth: AuthService::new(accounts, keys.clone()),
            profiles: ProfileService::new(profiles),
            trips: TripService::new(trips, index),
            keys,
        }
    }
}
