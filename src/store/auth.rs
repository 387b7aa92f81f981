use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use super::storage::{MemoryStorage, SessionStorage};
use super::{ActionError, OrMessage};
use crate::api::AuthApi;
use crate::data::user::{Credentials, Profile, TokenResponse, User};
use crate::error::ClientError;
use crate::resp::token::UserClaims;

/// Logged in identity. Holding a token without a user isn't representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn from_token(token: String) -> Result<Session, ClientError> {
        let claims = UserClaims::decode(&token)?;
        Ok(Session {
            token,
            user: claims.user,
        })
    }
}

#[derive(Clone)]
pub struct AuthStore {
    state: Arc<watch::Sender<Option<Session>>>,
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.user() {
            Some(user) => write!(f, "AuthStore:{}({})", user.id, user.role),
            None => write!(f, "AuthStore:anonymous"),
        }
    }
}

impl AuthStore {
    /// Restores any session persisted in `storage`, unless its token already
    /// expired.
    pub fn new(storage: impl SessionStorage + 'static) -> AuthStore {
        let session = match storage.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Unable to restore persisted session: {}", e);
                None
            }
        };

        let session = session.filter(|session| {
            let expired = UserClaims::decode(&session.token)
                .map(|claims| claims.is_expired(Utc::now()))
                .unwrap_or(true);
            if expired {
                tracing::info!("Persisted session expired; discarding it.");
                if let Err(e) = storage.clear() {
                    tracing::warn!("Unable to clear persisted session: {}", e);
                }
            }
            !expired
        });

        if let Some(session) = &session {
            tracing::info!("Restored session for user: {}", session.user.id);
        }

        let (state, _) = watch::channel(session);
        AuthStore {
            state: Arc::new(state),
            storage: Arc::new(storage),
        }
    }

    pub fn in_memory() -> AuthStore {
        AuthStore::new(MemoryStorage::default())
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|it| it.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|it| it.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    pub async fn login(
        &self,
        api: &impl AuthApi,
        credentials: &Credentials,
    ) -> Result<User, ActionError> {
        let response = api.login(credentials).await;
        self.establish(response).or_message("Login failed")
    }

    pub async fn register(
        &self,
        api: &impl AuthApi,
        profile: &Profile,
    ) -> Result<User, ActionError> {
        profile.validate().or_message("Registration failed")?;
        let response = api.register(profile).await;
        self.establish(response).or_message("Registration failed")
    }

    pub fn logout(&self) {
        tracing::info!("Logging out.");
        self.clear();
    }

    /// Called when the API rejects the token.
    pub fn expire(&self) {
        tracing::info!("Session expired; returning to login.");
        self.clear();
    }

    /// Adopts an existing session without contacting the API.
    pub fn restore(&self, session: Session) {
        self.persist(&session);
        self.state.send_replace(Some(session));
    }

    fn establish(&self, response: Result<TokenResponse, ClientError>) -> Result<User, ClientError> {
        let session = Session::from_token(response?.token)?;
        let user = session.user.clone();
        tracing::info!("Logged in as {} ({})", user.id, user.role);

        self.restore(session);
        Ok(user)
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = self.storage.save(session) {
            tracing::warn!("Unable to persist session: {}", e);
        }
    }

    fn clear(&self) {
        if let Err(e) = self.storage.clear() {
            tracing::warn!("Unable to clear persisted session: {}", e);
        }
        self.state.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::store::storage::FileStorage;
    use crate::testing::{scratch_dir, FakeApi};
    use reqwest::StatusCode;

    fn credentials() -> Credentials {
        Credentials {
            email: "t@example.org".to_string(),
            password: "pw".to_string(),
        }
    }

    #[tokio::test]
    async fn login_stores_token_and_role() {
        let api = FakeApi::with_user("u1", "Ms. Teacher", "teacher");
        let auth = AuthStore::in_memory();

        let user = auth.login(&api, &credentials()).await.expect("login works");

        assert_eq!(user.role, Role::Teacher);
        let session = auth.session().expect("session held");
        assert_eq!(session.user, user);
        assert!(!session.token.is_empty());
    }

    #[tokio::test]
    async fn failed_login_leaves_state_unchanged() {
        let api = FakeApi::default();
        api.fail_next(StatusCode::BAD_REQUEST, Some("Invalid Credentials"));
        let auth = AuthStore::in_memory();
        let changes = auth.subscribe();

        let err = auth.login(&api, &credentials()).await.unwrap_err();

        assert_eq!(err.message, "Invalid Credentials");
        assert!(auth.session().is_none());
        assert!(!changes.has_changed().expect("store alive"));
    }

    #[tokio::test]
    async fn login_without_server_message_uses_fallback() {
        let api = FakeApi::default();
        api.fail_next(StatusCode::INTERNAL_SERVER_ERROR, None);

        let err = AuthStore::in_memory()
            .login(&api, &credentials())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Login failed");
    }

    #[tokio::test]
    async fn register_validates_before_calling_api() {
        let api = FakeApi::with_user("s1", "Sam", "student");
        let auth = AuthStore::in_memory();
        let profile = Profile {
            name: "Sam".to_string(),
            email: "not an email".to_string(),
            password: "pw".to_string(),
            role: Role::Student,
        };

        assert!(auth.register(&api, &profile).await.is_err());
        assert_eq!(api.calls(), 0);

        let profile = Profile {
            email: "sam@example.org".to_string(),
            ..profile
        };
        let user = auth.register(&api, &profile).await.expect("registration works");
        assert_eq!(user.role, Role::Student);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn session_survives_restart_until_logout() {
        let path = scratch_dir().join("auth-storage.json");
        let api = FakeApi::with_user("s1", "Sam", "student");

        let auth = AuthStore::new(FileStorage::new(&path));
        auth.login(&api, &credentials()).await.expect("login works");
        let before = auth.session();

        let reloaded = AuthStore::new(FileStorage::new(&path));
        assert_eq!(reloaded.session(), before);

        reloaded.logout();
        assert!(reloaded.session().is_none());
        assert!(AuthStore::new(FileStorage::new(&path)).session().is_none());
    }

    #[test]
    fn expired_session_is_not_restored() {
        use crate::store::storage::MemoryStorage;
        use crate::testing::mint_token;
        use chrono::Duration;

        let storage = MemoryStorage::default();
        let token = mint_token("s1", "Sam", "student", Utc::now() - Duration::minutes(5));
        storage
            .save(&Session::from_token(token).expect("decodes"))
            .expect("saved");

        let auth = AuthStore::new(storage);
        assert!(auth.session().is_none());
    }

    #[tokio::test]
    async fn logout_notifies_subscribers() {
        let api = FakeApi::with_user("s1", "Sam", "student");
        let auth = AuthStore::in_memory();
        auth.login(&api, &credentials()).await.expect("login works");

        let mut changes = auth.subscribe();
        auth.logout();

        changes.changed().await.expect("store alive");
        assert!(changes.borrow().is_none());
    }

    #[tokio::test]
    async fn malformed_token_is_a_failure() {
        let api = FakeApi::default();
        api.set_token("garbage");

        let err = AuthStore::in_memory()
            .login(&api, &credentials())
            .await
            .unwrap_err();
        assert_eq!(err.message, "Login failed");
        assert!(matches!(err.source, ClientError::Token(_)));
    }
}
