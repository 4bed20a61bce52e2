use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{LoginRequest, SignupRequest, TokenPair},
    jwt::{JwtKeys, TokenError},
    password::{hash_password, verify_password},
    repo::account_key,
    repo_types::Account,
};
use crate::{
    database::{DatabaseError, Table},
    error::ServiceError,
};

pub const ACCOUNT_EXISTS: &str = "Account already exists";
pub const INVALID_CREDENTIALS: &str = "Invalid email or password, please try again";
pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// The account key is the email exactly as given, minus surrounding
/// whitespace. Case is preserved.
fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Account creation, credential checks and token rotation.
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn Table<Account>>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn Table<Account>>, keys: JwtKeys) -> Self {
        Self { accounts, keys }
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, ServiceError> {
        self.accounts.get(&account_key(email)).await.map_err(|e| {
            error!(error = %e, retryable = e.is_retryable(), "account lookup failed");
            ServiceError::from(e)
        })
    }

    /// Create an account and return its new user ID.
    pub async fn signup(&self, req: SignupRequest) -> Result<Uuid, ServiceError> {
        let email = normalize_email(&req.email);
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(ServiceError::validation("Invalid email"));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(ServiceError::validation("Password too short"));
        }
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("Name cannot be empty"));
        }

        // Fast path. `create` below still rejects a concurrent duplicate.
        if self.find_account(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(ServiceError::Conflict(ACCOUNT_EXISTS.into()));
        }

        let password = req.password;
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| {
                error!(error = %e, "hashing task failed");
                ServiceError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, "hash_password failed");
                ServiceError::Internal
            })?;

        let account = Account::new(&email, hash, name, req.phone.trim().to_string());
        self.accounts.create(&account).await.map_err(|e| match e {
            DatabaseError::AlreadyExists => {
                warn!(email = %email, "email registered concurrently");
                ServiceError::Conflict(ACCOUNT_EXISTS.into())
            }
            e => {
                error!(error = %e, email = %email, "create account failed");
                ServiceError::from(e)
            }
        })?;

        info!(user_id = %account.id, email = %email, "account created");
        Ok(account.id)
    }

    /// Check credentials and issue a token pair.
    pub async fn login(&self, req: LoginRequest) -> Result<TokenPair, ServiceError> {
        let email = normalize_email(&req.email);
        let Some(account) = self.find_account(&email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        };

        let password = req.password;
        let hash = account.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| {
                error!(error = %e, "verify task failed");
                ServiceError::Internal
            })?
            .map_err(|e| {
                error!(error = %e, user_id = %account.id, "stored hash is unreadable");
                ServiceError::Internal
            })?;

        if !ok {
            warn!(email = %email, user_id = %account.id, "login invalid password");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        let pair = self.issue(account.id)?;
        info!(user_id = %account.id, "user logged in");
        Ok(pair)
    }

    /// Exchange a valid refresh token for a new pair. Any failure is
    /// reported as a bare `Unauthorized`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.keys.verify_refresh(refresh_token).map_err(|e| {
            warn!(error = %e, "refresh token rejected");
            ServiceError::unauthorized("Unauthorized")
        })?;
        let pair = self.issue(claims.user_id)?;
        info!(user_id = %claims.user_id, "tokens refreshed");
        Ok(pair)
    }

    fn issue(&self, user_id: Uuid) -> Result<TokenPair, ServiceError> {
        self.keys.issue_pair(user_id).map_err(|e: TokenError| {
            error!(error = %e, user_id = %user_id, "jwt signing failed");
            ServiceError::Internal
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::claims::TokenKind,
        config::AppConfig,
        database::{KeySchema, MemoryTable, PARTITION_KEY},
    };

    fn service() -> (AuthService, MemoryTable<Account>, JwtKeys) {
        let table = MemoryTable::new(KeySchema::partition(PARTITION_KEY));
        let keys = JwtKeys::from(&AppConfig::for_tests().jwt);
        let svc = AuthService::new(Arc::new(table.clone()), keys.clone());
        (svc, table, keys)
    }

    fn signup_req(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.into(),
            password: password.into(),
            name: "A".into(),
            phone: "555-0100".into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("not an email"));
    }

    #[tokio::test]
    async fn signup_then_login() {
        let (svc, table, keys) = service();
        let user_id = svc
            .signup(signup_req("a@b.com", "Secret123!"))
            .await
            .expect("signup");
        assert!(!user_id.is_nil());

        let stored = table
            .get(&account_key("a@b.com"))
            .await
            .unwrap()
            .expect("account stored");
        assert_eq!(stored.id, user_id);
        assert_eq!(stored.pk, "a@b.com");
        assert_ne!(stored.password_hash, "Secret123!");

        let pair = svc
            .login(login_req("a@b.com", "Secret123!"))
            .await
            .expect("login");
        let claims = keys.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.user_id, user_id);
    }

    #[tokio::test]
    async fn email_key_is_trimmed_but_case_preserved() {
        let (svc, table, _) = service();
        svc.signup(signup_req("  Ada@B.com ", "Secret123!"))
            .await
            .unwrap();

        let stored = table.get(&account_key("Ada@B.com")).await.unwrap();
        assert_eq!(stored.expect("account stored").pk, "Ada@B.com");
        svc.login(login_req(" Ada@B.com", "Secret123!")).await.unwrap();

        let err = svc
            .login(login_req("ada@b.com", "Secret123!"))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), INVALID_CREDENTIALS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_signups_create_one_account() {
        let (svc, table, _) = service();
        let (a, b) = (svc.clone(), svc.clone());
        let (first, second) = tokio::join!(
            tokio::spawn(async move { a.signup(signup_req("a@b.com", "Secret123!")).await }),
            tokio::spawn(async move { b.signup(signup_req("a@b.com", "Other456!")).await }),
        );
        let results = [first.unwrap(), second.unwrap()];

        let winners: Vec<Uuid> = results.iter().filter_map(|r| r.clone().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert!(results
            .iter()
            .any(|r| *r == Err(ServiceError::Conflict(ACCOUNT_EXISTS.into()))));

        let stored = table.get(&account_key("a@b.com")).await.unwrap().unwrap();
        assert_eq!(stored.id, winners[0]);
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn create_conflict_maps_to_account_exists() {
        let (svc, table, _) = service();
        let existing = Account::new("a@b.com", "hash".into(), "A".into(), String::new());
        table.create(&existing).await.unwrap();

        let err = svc
            .signup(signup_req("a@b.com", "Secret123!"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Conflict(ACCOUNT_EXISTS.into()));
        let stored = table.get(&account_key("a@b.com")).await.unwrap().unwrap();
        assert_eq!(stored.id, existing.id);
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts_and_keeps_original() {
        let (svc, table, _) = service();
        let first = svc
            .signup(signup_req("a@b.com", "Secret123!"))
            .await
            .unwrap();

        let err = svc
            .signup(signup_req("a@b.com", "Other456!"))
            .await
            .unwrap_err();
        assert_eq!(err.code().as_u16(), 400);
        assert_eq!(err.reason(), ACCOUNT_EXISTS);

        let stored = table.get(&account_key("a@b.com")).await.unwrap().unwrap();
        assert_eq!(stored.id, first);
        assert_eq!(table.len().await, 1);
        svc.login(login_req("a@b.com", "Secret123!")).await.unwrap();
    }

    #[tokio::test]
    async fn signup_rejects_bad_input() {
        let (svc, table, _) = service();
        let err = svc
            .signup(signup_req("nope", "Secret123!"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = svc.signup(signup_req("a@b.com", "short")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let mut req = signup_req("a@b.com", "Secret123!");
        req.name = "   ".into();
        let err = svc.signup(req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert_eq!(table.len().await, 0);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (svc, _, _) = service();
        svc.signup(signup_req("a@b.com", "Secret123!"))
            .await
            .unwrap();

        let wrong = svc.login(login_req("a@b.com", "wrong")).await.unwrap_err();
        let unknown = svc
            .login(login_req("nobody@b.com", "Secret123!"))
            .await
            .unwrap_err();

        assert_eq!(wrong, unknown);
        assert_eq!(wrong.code().as_u16(), 401);
        assert_eq!(wrong.reason(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn refresh_issues_new_pair_for_same_subject() {
        let (svc, _, keys) = service();
        let user_id = svc
            .signup(signup_req("a@b.com", "Secret123!"))
            .await
            .unwrap();
        let first = svc
            .login(login_req("a@b.com", "Secret123!"))
            .await
            .unwrap();

        let second = svc.refresh(&first.refresh_token).await.expect("refresh");
        let old = keys.verify_access(&first.access_token).unwrap();
        let new = keys.verify_access(&second.access_token).unwrap();
        assert_eq!(new.user_id, user_id);
        assert_ne!(new.id, old.id);
    }

    #[tokio::test]
    async fn refresh_rejects_expired_and_access_tokens() {
        let (svc, _, keys) = service();
        let user_id = Uuid::new_v4();

        let long_ago = time::OffsetDateTime::now_utc() - time::Duration::days(30);
        let expired = keys
            .sign_with_kind(user_id, TokenKind::Refresh, long_ago)
            .unwrap();
        let err = svc.refresh(&expired).await.unwrap_err();
        assert_eq!(err, ServiceError::unauthorized("Unauthorized"));

        let pair = keys.issue_pair(user_id).unwrap();
        let err = svc.refresh(&pair.access_token).await.unwrap_err();
        assert_eq!(err.code().as_u16(), 401);
    }
}
