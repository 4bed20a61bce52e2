use serde::Deserialize;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 366 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            anyhow::bail!("jwt secrets must not be empty");
        }
        if self.access_secret == self.refresh_secret {
            anyhow::bail!("access and refresh tokens must use different secrets");
        }
        if self.access_ttl_minutes <= 0 || self.refresh_ttl_minutes <= self.access_ttl_minutes {
            anyhow::bail!("refresh token lifetime must exceed a positive access token lifetime");
        }
        if self.refresh_ttl_minutes > MAX_TOKEN_TTL_MINUTES {
            anyhow::bail!("token lifetimes must not exceed {MAX_TOKEN_TTL_MINUTES} minutes");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Dynamodb,
    Memory,
}

impl std::str::FromStr for DatabaseBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(Self::Dynamodb),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown DATABASE_BACKEND {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DynamoConfig {
    pub backend: DatabaseBackend,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub auth_table: String,
    pub application_table: String,
    pub application_index: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub dynamo: DynamoConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            access_secret: std::env::var("JWT_ACCESS_SECRET")?,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET")?,
            access_ttl_minutes: std::env::var("JWT_ACCESS_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        jwt.validate()?;

        let dynamo = DynamoConfig {
            backend: std::env::var("DATABASE_BACKEND")
                .map(|v| v.parse())
                .unwrap_or(Ok(DatabaseBackend::Dynamodb))?,
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into()),
            endpoint: std::env::var("DYNAMODB_ENDPOINT").ok(),
            access_key: std::env::var("DYNAMODB_ACCESS_KEY").ok(),
            secret_key: std::env::var("DYNAMODB_SECRET_KEY").ok(),
            auth_table: std::env::var("AUTH_TABLE").unwrap_or_else(|_| "Authentication".into()),
            application_table: std::env::var("APPLICATION_TABLE")
                .unwrap_or_else(|_| "APPLICATION".into()),
            application_index: std::env::var("APPLICATION_INDEX")
                .unwrap_or_else(|_| "APPLICATION_GSI_1".into()),
        };

        let server = ServerConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .map(|v| v.parse::<u16>())
                .transpose()?
                .unwrap_or(8080),
        };

        Ok(Self {
            jwt,
            dynamo,
            server,
        })
    }

    /// Fixed configuration over the in-memory backend.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            jwt: JwtConfig {
                access_secret: "test-access-secret".into(),
                refresh_secret: "test-refresh-secret".into(),
                access_ttl_minutes: 15,
                refresh_ttl_minutes: 60 * 24 * 7,
            },
            dynamo: DynamoConfig {
                backend: DatabaseBackend::Memory,
                region: "us-east-1".into(),
                endpoint: None,
                access_key: None,
                secret_key: None,
                auth_table: "Authentication".into(),
                application_table: "APPLICATION".into(),
                application_index: "APPLICATION_GSI_1".into(),
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
        }
    }
}
