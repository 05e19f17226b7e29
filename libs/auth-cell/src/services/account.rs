use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{ADMIN_ROLE, USER_ROLE};
use shared_utils::jwt::issue_token;

use crate::models::{
    normalize_email, AuthError, AuthResponse, LoginRequest, RegisterRequest, UserAccount,
    MIN_PASSWORD_LENGTH,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::users::UserDirectory;

pub struct AccountService {
    users: Arc<dyn UserDirectory>,
    config: Arc<AppConfig>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, AuthError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingField(field))
}

impl AccountService {
    pub fn new(users: Arc<dyn UserDirectory>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// Self-registration always creates a plain user.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let name = required(request.name, "name")?;
        let email = normalize_email(&required(request.email, "email")?);
        let password = request.password.filter(|p| !p.is_empty()).ok_or(AuthError::MissingField("password"))?;

        if !email.contains('@') {
            return Err(AuthError::Validation("Email address is not valid".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long", MIN_PASSWORD_LENGTH
            )));
        }

        let account = self.create_account(name, email, &password, USER_ROLE).await?;
        info!("Registered user {}", account.id);
        self.respond(account)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = required(request.email, "email")?;
        let password = request.password.filter(|p| !p.is_empty()).ok_or(AuthError::MissingField("password"))?;

        let account = self.users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = verify_password(&password, &account.password_hash)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        if !matches {
            debug!("Password mismatch for user {}", account.id);
            return Err(AuthError::InvalidCredentials);
        }

        self.respond(account)
    }

    pub async fn get_account(&self, user_id: &str) -> Result<UserAccount, AuthError> {
        let id = Uuid::parse_str(user_id).map_err(|_| AuthError::NotFound)?;
        self.users.find_by_id(id).await?.ok_or(AuthError::NotFound)
    }

    /// Creates the configured administrator if no account has that email yet.
    pub async fn ensure_bootstrap_admin(&self) -> Result<Option<UserAccount>, AuthError> {
        let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password) else {
            return Ok(None);
        };

        if let Some(existing) = self.users.find_by_email(email).await? {
            if existing.role != ADMIN_ROLE {
                warn!("Bootstrap admin email {} belongs to a non-admin account", existing.email);
            }
            return Ok(Some(existing));
        }

        let account = self
            .create_account("Administrator".to_string(), normalize_email(email), password, ADMIN_ROLE)
            .await?;
        info!("Bootstrap administrator {} created", account.email);
        Ok(Some(account))
    }

    async fn create_account(
        &self,
        name: String,
        email: String,
        password: &str,
        role: &str,
    ) -> Result<UserAccount, AuthError> {
        let password_hash = hash_password(password)
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        self.users.insert(UserAccount {
            id: Uuid::new_v4(),
            name,
            email,
            role: role.to_string(),
            password_hash,
            created_at: Utc::now(),
        }).await
    }

    fn respond(&self, account: UserAccount) -> Result<AuthResponse, AuthError> {
        let token = issue_token(&account.to_user(), &self.config.jwt_secret, self.config.token_ttl_hours)
            .map_err(AuthError::Token)?;
        Ok(AuthResponse { user: account, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_utils::jwt::validate_token;
    use crate::services::users::InMemoryUserDirectory;

    fn config() -> AppConfig {
        AppConfig {
            jwt_secret: "unit-test-secret".to_string(),
            ..AppConfig::default()
        }
    }

    fn service_with(config: AppConfig) -> AccountService {
        AccountService::new(Arc::new(InMemoryUserDirectory::new()), Arc::new(config))
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some("Ana".to_string()),
            email: Some(email.to_string()),
            password: Some("long-enough-pw".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service_with(config());

        let registered = service.register(register_request("Ana@Example.com")).await.unwrap();
        assert_eq!(registered.user.email, "ana@example.com");
        assert_eq!(registered.user.role, "user");

        let user = validate_token(&registered.token, "unit-test-secret").unwrap();
        assert_eq!(user.id, registered.user.id.to_string());

        let logged_in = service.login(LoginRequest {
            email: Some("ana@example.com".to_string()),
            password: Some("long-enough-pw".to_string()),
        }).await.unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_missing_fields() {
        let service = service_with(config());
        service.register(register_request("ana@example.com")).await.unwrap();

        assert_matches!(service.register(register_request("ana@example.com")).await, Err(AuthError::EmailTaken));
        assert_matches!(
            service.register(RegisterRequest { name: None, ..register_request("b@example.com") }).await,
            Err(AuthError::MissingField("name"))
        );
        assert_matches!(
            service.register(RegisterRequest { password: Some("short".to_string()), ..register_request("c@example.com") }).await,
            Err(AuthError::Validation(_))
        );
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service_with(config());
        service.register(register_request("ana@example.com")).await.unwrap();

        let wrong_password = service.login(LoginRequest {
            email: Some("ana@example.com".to_string()),
            password: Some("not-the-password".to_string()),
        }).await;
        let unknown_email = service.login(LoginRequest {
            email: Some("nobody@example.com".to_string()),
            password: Some("whatever-pw".to_string()),
        }).await;

        assert_matches!(wrong_password, Err(AuthError::InvalidCredentials));
        assert_matches!(unknown_email, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_created_once() {
        let service = service_with(AppConfig {
            admin_email: Some("root@example.com".to_string()),
            admin_password: Some("admin-password".to_string()),
            ..config()
        });

        let first = service.ensure_bootstrap_admin().await.unwrap().unwrap();
        assert_eq!(first.role, "admin");
        let second = service.ensure_bootstrap_admin().await.unwrap().unwrap();
        assert_eq!(first.id, second.id);

        assert!(service_with(config()).ensure_bootstrap_admin().await.unwrap().is_none());
    }
}
