//! # Auth Flow
//!
//! The combined login-or-register operation and the thinner account
//! operations around it.
//!
//! `login_or_register` is keyed on email presence alone: an unknown email
//! registers a new customer, a known one is a login attempt. A typo in a
//! registration that happens to hit an existing address therefore turns
//! into a (failing) login.

use crate::config::AuthConfig;
use crate::password::PasswordHasher;
use crate::token::TokenIssuer;
use serde::Deserialize;
use shop_core::user::{required_name, validate_password};
use shop_core::{CredentialStore, Email, NewUser, Role, ShopError, ShopResult, User};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const MISSING_CREDENTIALS: &str = "Email and Password are required";
const MISSING_NAMES: &str = "First and Last name are required for registration";
const INCOMPLETE_FORM: &str = "Please Fill Full Form!";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Body of the login-or-register call
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOrRegister {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Body of the explicit registration calls (customer, admin, doctor)
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Result of a successful login or registration
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    /// True when the call registered a new user
    pub created: bool,
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl AuthService {
    pub fn new(users: Arc<dyn CredentialStore>, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Build with the default hasher cost and the configured token settings
    pub fn from_config(users: Arc<dyn CredentialStore>, config: &AuthConfig) -> Self {
        Self::new(
            users,
            PasswordHasher::new(),
            TokenIssuer::new(config.secret_bytes(), config.token_ttl),
        )
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Log in with an existing email, or register a customer for an unknown one.
    #[instrument(skip_all)]
    pub async fn login_or_register(&self, request: LoginOrRegister) -> ShopResult<AuthOutcome> {
        let (raw_email, password) =
            match (present(request.email.as_deref()), present(request.password.as_deref())) {
                (Some(e), Some(p)) => (e, p.to_string()),
                _ => return Err(ShopError::validation(MISSING_CREDENTIALS)),
            };
        let email = Email::parse(raw_email)?;

        match self.users.find_credentials(&email).await? {
            None => {
                if present(request.first_name.as_deref()).is_none()
                    || present(request.last_name.as_deref()).is_none()
                {
                    return Err(ShopError::validation(MISSING_NAMES));
                }

                let user = self
                    .create_user(
                        Role::Customer,
                        request.first_name.as_deref(),
                        request.last_name.as_deref(),
                        email,
                        password,
                    )
                    .await?;
                let token = self.tokens.issue(user.id)?;

                info!("Registered customer: id={}", user.id);
                Ok(AuthOutcome {
                    created: true,
                    user,
                    token,
                })
            }
            Some(credentials) => {
                let matches = self
                    .hasher
                    .verify_blocking(password, credentials.password_hash)
                    .await?;
                if !matches {
                    warn!("Failed login: id={}", credentials.user.id);
                    return Err(ShopError::InvalidCredentials(INVALID_CREDENTIALS.to_string()));
                }

                let token = self.tokens.issue(credentials.user.id)?;

                info!("Login: id={}", credentials.user.id);
                Ok(AuthOutcome {
                    created: false,
                    user: credentials.user,
                    token,
                })
            }
        }
    }

    /// Explicit customer self-registration. An existing email is a conflict.
    #[instrument(skip_all)]
    pub async fn register_customer(&self, request: Registration) -> ShopResult<AuthOutcome> {
        let (email, password) = Self::complete_form(&request)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ShopError::Conflict("User already registered!".to_string()));
        }

        let user = self
            .create_user(
                Role::Customer,
                request.first_name.as_deref(),
                request.last_name.as_deref(),
                email,
                password,
            )
            .await?;
        let token = self.tokens.issue(user.id)?;

        info!("Registered customer: id={}", user.id);
        Ok(AuthOutcome {
            created: true,
            user,
            token,
        })
    }

    /// Create an Admin or Doctor record on behalf of an admin.
    #[instrument(skip(self, request))]
    pub async fn add_staff(&self, role: Role, request: Registration) -> ShopResult<User> {
        if role == Role::Customer {
            return Err(ShopError::validation("Customers register themselves"));
        }

        let (email, password) = Self::complete_form(&request)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ShopError::Conflict(format!(
                "{} with this email already exists!",
                role
            )));
        }

        let user = self
            .create_user(
                role,
                request.first_name.as_deref(),
                request.last_name.as_deref(),
                email,
                password,
            )
            .await?;

        info!("Added {}: id={}", role, user.id);
        Ok(user)
    }

    /// Users holding `role`
    pub async fn list_by_role(&self, role: Role) -> ShopResult<Vec<User>> {
        self.users.list_by_role(role).await
    }

    /// Resolve a bearer/cookie token to its user.
    pub async fn authenticate(&self, token: &str) -> ShopResult<User> {
        let user_id = self.tokens.verify(token)?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ShopError::unauthenticated("User not found"))
    }

    fn complete_form(request: &Registration) -> ShopResult<(Email, String)> {
        match (
            present(request.first_name.as_deref()),
            present(request.last_name.as_deref()),
            present(request.email.as_deref()),
            present(request.password.as_deref()),
        ) {
            (Some(_), Some(_), Some(email), Some(password)) => {
                Ok((Email::parse(email)?, password.to_string()))
            }
            _ => Err(ShopError::validation(INCOMPLETE_FORM)),
        }
    }

    /// Validate, hash on write, insert.
    async fn create_user(
        &self,
        role: Role,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Email,
        password: String,
    ) -> ShopResult<User> {
        let first_name = required_name("First Name", first_name)?;
        let last_name = required_name("Last Name", last_name)?;
        validate_password(&password)?;

        let password_hash = self.hasher.hash_blocking(password).await?;

        self.users
            .insert(NewUser {
                first_name,
                last_name,
                email,
                password_hash,
                role,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counting::CountingStore;
    use chrono::Duration;
    use shop_core::MemoryCredentialStore;

    /// Wraps the in-memory store and counts lookups.
    mod counting {
        use shop_core::{
            CredentialStore, Email, MemoryCredentialStore, NewUser, Role, ShopResult, User,
            UserCredentials, UserId,
        };
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        pub struct CountingStore {
            pub inner: MemoryCredentialStore,
            pub calls: AtomicUsize,
        }

        impl CountingStore {
            pub fn calls(&self) -> usize {
                self.calls.load(Ordering::SeqCst)
            }

            fn hit(&self) {
                self.calls.fetch_add(1, Ordering::SeqCst);
            }
        }

        #[async_trait::async_trait]
        impl CredentialStore for CountingStore {
            async fn find_by_email(&self, email: &Email) -> ShopResult<Option<User>> {
                self.hit();
                self.inner.find_by_email(email).await
            }

            async fn find_credentials(&self, email: &Email) -> ShopResult<Option<UserCredentials>> {
                self.hit();
                self.inner.find_credentials(email).await
            }

            async fn find_by_id(&self, id: UserId) -> ShopResult<Option<User>> {
                self.hit();
                self.inner.find_by_id(id).await
            }

            async fn insert(&self, user: NewUser) -> ShopResult<User> {
                self.hit();
                self.inner.insert(user).await
            }

            async fn list_by_role(&self, role: Role) -> ShopResult<Vec<User>> {
                self.hit();
                self.inner.list_by_role(role).await
            }
        }
    }

    fn service_with(users: Arc<dyn CredentialStore>) -> AuthService {
        AuthService::new(
            users,
            PasswordHasher::with_cost(64, 1, 1).unwrap(),
            TokenIssuer::new(b"test-secret", Duration::days(7)),
        )
    }

    fn service() -> (Arc<MemoryCredentialStore>, AuthService) {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = service_with(store.clone());
        (store, service)
    }

    fn login(email: &str, password: &str) -> LoginOrRegister {
        LoginOrRegister {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    fn signup(email: &str, password: &str) -> LoginOrRegister {
        LoginOrRegister {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            ..login(email, password)
        }
    }

    #[tokio::test]
    async fn test_unknown_email_registers_customer() {
        let (store, auth) = service();

        let outcome = auth.login_or_register(signup("Ada@Example.com", "secret1!")).await.unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.user.role, Role::Customer);
        assert_eq!(outcome.user.email.as_str(), "ada@example.com");
        assert_eq!(store.len(), 1);
        assert_eq!(auth.tokens().verify(&outcome.token).unwrap(), outcome.user.id);

        let creds = store.find_credentials(&outcome.user.email).await.unwrap().unwrap();
        assert_ne!(creds.password_hash, "secret1!");
    }

    #[tokio::test]
    async fn test_existing_email_logs_in() {
        let (store, auth) = service();
        let registered = auth.login_or_register(signup("ada@example.com", "secret1!")).await.unwrap();

        let outcome = auth.login_or_register(login("ADA@example.com", "secret1!")).await.unwrap();

        assert!(!outcome.created);
        assert_eq!(outcome.user.id, registered.user.id);
        assert_eq!(auth.tokens().verify(&outcome.token).unwrap(), registered.user.id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let (_, auth) = service();
        auth.login_or_register(signup("ada@example.com", "secret1!")).await.unwrap();

        let err = auth
            .login_or_register(login("ada@example.com", "secret2!"))
            .await
            .unwrap_err();

        assert!(matches!(err, ShopError::InvalidCredentials(_)));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_names_required_for_registration() {
        let (store, auth) = service();

        let err = auth
            .login_or_register(login("a@b.com", "secret1!"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "First and Last name are required for registration");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_password_fails_before_store() {
        let store = Arc::new(CountingStore::default());
        let auth = service_with(store.clone());

        for request in [
            LoginOrRegister {
                email: Some("ada@example.com".into()),
                ..Default::default()
            },
            LoginOrRegister {
                password: Some("secret1!".into()),
                ..Default::default()
            },
            login("ada@example.com", "   "),
        ] {
            let err = auth.login_or_register(request).await.unwrap_err();
            assert_eq!(err.to_string(), "Email and Password are required");
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_short_password_rejected_on_registration() {
        let (store, auth) = service();

        let err = auth
            .login_or_register(signup("ada@example.com", "short"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_register_customer_conflict() {
        let (_, auth) = service();
        let form = || Registration {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            password: Some("secret1!".into()),
        };

        auth.register_customer(form()).await.unwrap();
        let err = auth.register_customer(form()).await.unwrap_err();
        assert_eq!(err.status_code(), 409);

        let err = auth
            .register_customer(Registration {
                last_name: None,
                ..form()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please Fill Full Form!");
    }

    #[tokio::test]
    async fn test_add_staff_and_list() {
        let (_, auth) = service();
        let form = |email: &str| Registration {
            first_name: Some("Gregory".into()),
            last_name: Some("House".into()),
            email: Some(email.into()),
            password: Some("vicodin123".into()),
        };

        let doctor = auth.add_staff(Role::Doctor, form("house@ppth.org")).await.unwrap();
        assert_eq!(doctor.role, Role::Doctor);
        auth.add_staff(Role::Admin, form("cuddy@ppth.org")).await.unwrap();

        let doctors = auth.list_by_role(Role::Doctor).await.unwrap();
        assert_eq!(doctors, vec![doctor]);

        assert!(auth.add_staff(Role::Customer, form("x@ppth.org")).await.is_err());
        assert_eq!(
            auth.add_staff(Role::Doctor, form("house@ppth.org"))
                .await
                .unwrap_err()
                .status_code(),
            409
        );
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (_, auth) = service();
        let outcome = auth.login_or_register(signup("ada@example.com", "secret1!")).await.unwrap();

        let user = auth.authenticate(&outcome.token).await.unwrap();
        assert_eq!(user.id, outcome.user.id);

        let stranger = auth.tokens().issue(shop_core::UserId::new()).unwrap();
        assert_eq!(auth.authenticate(&stranger).await.unwrap_err().status_code(), 401);
    }
}
