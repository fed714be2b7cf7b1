use shop_types::domain::user::{Credentials, Principal, Registration, User, UserProfile};
use shop_types::ports::auth::{PasswordHasher, TokenIssuer};
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use std::sync::Arc;

use crate::errors::AppError;

pub struct AuthService<U: UserRepository> {
    users: Arc<U>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(users: Arc<U>, hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<(UserProfile, String), AppError> {
        let role = registration.validate()?;
        let hash = self.hasher.hash(&registration.password);
        let user = User::new(&registration.name, &registration.email, hash, role);
        let user = self.users.create_user(user).await.map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::Duplicate("Email already registered".into()),
            other => other.into(),
        })?;
        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        let token = self.tokens.issue(user.principal());
        Ok((UserProfile::from(&user), token))
    }

    pub async fn login(&self, credentials: Credentials) -> Result<String, AppError> {
        credentials.validate()?;
        let invalid = || AppError::Unauthorized("Invalid credentials".into());
        let user = self
            .users
            .find_user_by_email(&credentials.email)
            .await?
            .ok_or_else(invalid)?;
        if !self.hasher.verify(&credentials.password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "rejected login");
            return Err(invalid());
        }
        Ok(self.tokens.issue(user.principal()))
    }

    pub async fn profile(&self, actor: &Principal) -> Result<UserProfile, AppError> {
        self.users
            .get_user(actor.user_id)
            .await?
            .map(|u| UserProfile::from(&u))
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        self.tokens
            .resolve(token)
            .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{SaltedSha256, SessionTokens};
    use shop_repo::memory::InMemoryRepo;
    use shop_types::domain::user::Role;
    use std::time::Duration;

    fn service() -> AuthService<InMemoryRepo> {
        AuthService::new(
            Arc::new(InMemoryRepo::new()),
            Arc::new(SaltedSha256),
            Arc::new(SessionTokens::new(Duration::from_secs(60))),
        )
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: "Ann".into(),
            email: email.into(),
            password: "secret1".into(),
            role: Some("Admin".into()),
        }
    }

    #[tokio::test]
    async fn register_login_profile_flow() {
        let svc = service();
        let (profile, token) = svc.register(registration("ann@example.com")).await.unwrap();
        assert_eq!(profile.role, Role::Admin);

        let principal = svc.authenticate(&token).unwrap();
        assert_eq!(principal.user_id, profile.id);

        let login = svc
            .login(Credentials {
                email: "ANN@example.com".into(),
                password: "secret1".into(),
            })
            .await
            .unwrap();
        assert_eq!(svc.profile(&svc.authenticate(&login).unwrap()).await.unwrap(), profile);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let svc = service();
        svc.register(registration("dup@example.com")).await.unwrap();
        let again = svc.register(registration("dup@example.com")).await;
        assert!(matches!(again, Err(AppError::Duplicate(_))));
    }

    #[tokio::test]
    async fn bad_credentials_and_tokens_are_unauthorized() {
        let svc = service();
        svc.register(registration("ann@example.com")).await.unwrap();
        let wrong = svc
            .login(Credentials {
                email: "ann@example.com".into(),
                password: "wrong-password".into(),
            })
            .await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
        let unknown = svc
            .login(Credentials {
                email: "who@example.com".into(),
                password: "secret1".into(),
            })
            .await;
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
        assert!(matches!(svc.authenticate("forged"), Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn invalid_registration_is_validation_error() {
        let svc = service();
        let res = svc.register(Registration::default()).await;
        assert!(matches!(res, Err(AppError::Validation { details }) if details.len() == 3));
    }
}
