//! Admin authentication: login flow and the single require-admin guard used
//! by every protected route.

use crate::backend::SharedBackend;
use crate::errors::AppError;
use crate::models::{AuthUser, Session, ADMIN_ROLE};
use crate::obs::fingerprint;

pub const MSG_LOGIN_OK: &str = "Login realizado com sucesso!";
pub const DASHBOARD_ROUTE: &str = "/admin";

/// Proof that a session passed the admin guard.
///
/// Only [`AuthService`] can build one.
#[derive(Debug, Clone)]
pub struct AdminSession {
    access_token: String,
    user: AuthUser,
}

impl AdminSession {
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }
}

/// Result of the require-admin guard.
#[derive(Debug, Clone)]
pub enum AdminCheck {
    Authorized(AdminSession),
    /// Authenticated without the admin role. The session has been signed out.
    Denied,
    Unauthenticated,
}

impl AdminCheck {
    pub fn into_result(self) -> Result<AdminSession, AppError> {
        match self {
            AdminCheck::Authorized(session) => Ok(session),
            AdminCheck::Denied => Err(AppError::Forbidden("missing admin role".to_string())),
            AdminCheck::Unauthenticated => {
                Err(AppError::Unauthenticated("no active session".to_string()))
            }
        }
    }
}

pub fn has_admin_role(roles: &[String]) -> bool {
    roles.iter().any(|r| r == ADMIN_ROLE)
}

/// States of the login view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Anonymous,
    Authenticating,
    AdminVerified,
    Authorized,
    NotAdmin,
    SignedOutDenied,
    AuthFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginEvent {
    Submit,
    AdminConfirmed,
    RoleMissing,
    CredentialsRejected,
    Proceed,
    SignedOut,
    Reset,
}

impl LoginState {
    /// Applies an event; `None` when the event is not valid in this state.
    pub fn next(self, event: LoginEvent) -> Option<LoginState> {
        use LoginEvent::*;
        use LoginState::*;

        match (self, event) {
            (Anonymous, Submit) => Some(Authenticating),
            (Authenticating, AdminConfirmed) => Some(AdminVerified),
            (Authenticating, RoleMissing) => Some(NotAdmin),
            (Authenticating, CredentialsRejected) => Some(AuthFailed),
            (AdminVerified, Proceed) => Some(Authorized),
            (NotAdmin, SignedOut) => Some(SignedOutDenied),
            (AuthFailed, Reset) => Some(Anonymous),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoginState::Authorized | LoginState::SignedOutDenied | LoginState::Anonymous
        )
    }
}

/// Tracks one login attempt through its states.
#[derive(Debug)]
struct LoginFlow {
    state: LoginState,
    email_tag: String,
}

impl LoginFlow {
    fn new(email: &str) -> Self {
        Self {
            state: LoginState::Anonymous,
            email_tag: fingerprint(email),
        }
    }

    fn advance(&mut self, event: LoginEvent) {
        match self.state.next(event) {
            Some(next) => {
                tracing::debug!(
                    "Login {}: {:?} -> {:?}",
                    self.email_tag,
                    self.state,
                    next
                );
                self.state = next;
            }
            None => tracing::warn!(
                "Login {}: ignored {:?} in state {:?}",
                self.email_tag,
                event,
                self.state
            ),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    backend: SharedBackend,
}

impl AuthService {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// The one admin check shared by login and every protected route.
    ///
    /// A session whose admin role is missing or cannot be confirmed is
    /// signed out before `Denied` is returned.
    pub async fn require_admin(&self, access_token: Option<&str>) -> Result<AdminCheck, AppError> {
        let Some(token) = access_token.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(AdminCheck::Unauthenticated);
        };

        let Some(user) = self.backend.get_session(token).await? else {
            return Ok(AdminCheck::Unauthenticated);
        };

        let roles = match self.backend.fetch_roles(&user.id, token).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!("❌ Role lookup failed for user {}, signing out: {}", user.id, e);
                self.sign_out_quietly(token).await;
                return Ok(AdminCheck::Denied);
            }
        };
        if !has_admin_role(&roles) {
            tracing::warn!("❌ User {} lacks admin role, signing out", user.id);
            self.sign_out_quietly(token).await;
            return Ok(AdminCheck::Denied);
        }

        Ok(AdminCheck::Authorized(AdminSession {
            access_token: token.to_string(),
            user,
        }))
    }

    /// Signs in with email and password, then re-checks the admin role.
    ///
    /// Returns the session only for admins; non-admins are signed out
    /// immediately.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let mut flow = LoginFlow::new(email);
        flow.advance(LoginEvent::Submit);

        let session = match self.backend.sign_in_with_password(email.trim(), password).await {
            Ok(session) => session,
            Err(e) => {
                flow.advance(LoginEvent::CredentialsRejected);
                flow.advance(LoginEvent::Reset);
                return Err(match e {
                    AppError::Auth(_) => e,
                    other => AppError::Auth(other.to_string()),
                });
            }
        };

        let roles = match self
            .backend
            .fetch_roles(&session.user.id, &session.access_token)
            .await
        {
            Ok(roles) => roles,
            Err(e) => {
                // Do not leave a session behind whose role is unknown
                self.sign_out_quietly(&session.access_token).await;
                flow.advance(LoginEvent::CredentialsRejected);
                flow.advance(LoginEvent::Reset);
                return Err(AppError::Auth(e.to_string()));
            }
        };

        if !has_admin_role(&roles) {
            flow.advance(LoginEvent::RoleMissing);
            self.sign_out_quietly(&session.access_token).await;
            flow.advance(LoginEvent::SignedOut);
            return Err(AppError::Forbidden(format!(
                "user {} is not an admin",
                session.user.id
            )));
        }

        flow.advance(LoginEvent::AdminConfirmed);
        flow.advance(LoginEvent::Proceed);
        tracing::info!("✓ Admin {} signed in", session.user.id);
        Ok(session)
    }

    pub async fn logout(&self, access_token: &str) -> Result<(), AppError> {
        self.backend.sign_out(access_token).await
    }

    async fn sign_out_quietly(&self, access_token: &str) {
        if let Err(e) = self.backend.sign_out(access_token).await {
            tracing::warn!("Sign-out failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_backend::InMemoryBackend;
    use std::sync::Arc;

    #[test]
    fn test_state_machine_paths() {
        use LoginEvent::*;
        use LoginState::*;

        assert_eq!(Anonymous.next(Submit), Some(Authenticating));
        assert_eq!(Authenticating.next(AdminConfirmed), Some(AdminVerified));
        assert_eq!(AdminVerified.next(Proceed), Some(Authorized));
        assert_eq!(Authenticating.next(RoleMissing), Some(NotAdmin));
        assert_eq!(NotAdmin.next(SignedOut), Some(SignedOutDenied));
        assert_eq!(Authenticating.next(CredentialsRejected), Some(AuthFailed));
        assert_eq!(AuthFailed.next(Reset), Some(Anonymous));

        assert_eq!(Anonymous.next(Proceed), None);
        assert_eq!(NotAdmin.next(Proceed), None);
        assert!(SignedOutDenied.is_terminal());
        assert!(!NotAdmin.is_terminal());
    }

    #[test]
    fn test_has_admin_role() {
        assert!(has_admin_role(&["viewer".into(), "admin".into()]));
        assert!(!has_admin_role(&["Admin".into()]));
        assert!(!has_admin_role(&[]));
    }

    #[tokio::test]
    async fn test_require_admin_without_token() {
        let backend = Arc::new(InMemoryBackend::new());
        let auth = AuthService::new(backend);

        assert!(matches!(
            auth.require_admin(None).await.unwrap(),
            AdminCheck::Unauthenticated
        ));
        assert!(matches!(
            auth.require_admin(Some("  ")).await.unwrap(),
            AdminCheck::Unauthenticated
        ));
        assert!(matches!(
            auth.require_admin(Some("stale")).await.unwrap(),
            AdminCheck::Unauthenticated
        ));
    }

    #[tokio::test]
    async fn test_require_admin_denies_and_signs_out() {
        let backend = Arc::new(InMemoryBackend::new().with_user("op@x.com", "pw", &["operator"]));
        let token = backend.open_session("op@x.com").unwrap();
        let auth = AuthService::new(backend.clone());

        let check = auth.require_admin(Some(&token)).await.unwrap();
        assert!(matches!(check, AdminCheck::Denied));
        assert!(!backend.is_session_active(&token));
        assert_eq!(backend.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn test_require_admin_role_lookup_failure_signs_out() {
        let backend = Arc::new(InMemoryBackend::new().with_user("adm@x.com", "pw", &["admin"]));
        let token = backend.open_session("adm@x.com").unwrap();
        backend.fail_role_lookups(true);
        let auth = AuthService::new(backend.clone());

        let check = auth.require_admin(Some(&token)).await.unwrap();
        assert!(matches!(check, AdminCheck::Denied));
        assert!(!backend.is_session_active(&token));
        assert_eq!(backend.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn test_login_role_lookup_failure_is_auth_error() {
        let backend = Arc::new(InMemoryBackend::new().with_user("adm@x.com", "pw", &["admin"]));
        backend.fail_role_lookups(true);
        let auth = AuthService::new(backend.clone());

        let err = auth.login("adm@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert_eq!(backend.sign_out_count(), 1);
    }

    #[tokio::test]
    async fn test_login_admin() {
        let backend = Arc::new(InMemoryBackend::new().with_user("adm@x.com", "pw", &["admin"]));
        let auth = AuthService::new(backend.clone());

        let session = auth.login("adm@x.com", "pw").await.unwrap();
        assert!(backend.is_session_active(&session.access_token));

        let check = auth.require_admin(Some(&session.access_token)).await.unwrap();
        match check {
            AdminCheck::Authorized(admin) => assert_eq!(admin.user().id, session.user.id),
            other => panic!("expected authorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let backend = Arc::new(InMemoryBackend::new().with_user("adm@x.com", "pw", &["admin"]));
        let auth = AuthService::new(backend);

        let err = auth.login("adm@x.com", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }

    #[tokio::test]
    async fn test_login_non_admin_signed_out() {
        let backend = Arc::new(InMemoryBackend::new().with_user("op@x.com", "pw", &[]));
        let auth = AuthService::new(backend.clone());

        let err = auth.login("op@x.com", "pw").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(backend.sign_out_count(), 1);
    }
}
