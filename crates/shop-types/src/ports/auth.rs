use crate::domain::user::Principal;

pub trait PasswordHasher: Send + Sync + 'static {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Issues and resolves bearer tokens.
pub trait TokenIssuer: Send + Sync + 'static {
    fn issue(&self, principal: Principal) -> String;
    fn resolve(&self, token: &str) -> Option<Principal>;
}
