use std::sync::Arc;
use validator::Validate;

use crate::database::UserStore;
use crate::dto::auth_dto::SignUpPayload;
use crate::error::{Error, Result};
use crate::models::user::LoginIdentity;
use crate::services::identity_provider::{IdentityProvider, NewAccount};
use crate::services::session::{IssuedSession, SessionSigner};

/// Turns identity provider assertions into application sessions.
#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserStore>,
    sessions: SessionSigner,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
        sessions: SessionSigner,
    ) -> Self {
        Self {
            identity,
            users,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionSigner {
        &self.sessions
    }

    /// Nothing is written unless the assertion verifies.
    pub async fn sign_in(&self, id_token: &str) -> Result<IssuedSession> {
        let id_token = id_token.trim();
        if id_token.is_empty() {
            return Err(Error::BadRequest("idToken is required".to_string()));
        }

        let verified = self.identity.verify_id_token(id_token).await?;
        self.open_session(LoginIdentity {
            uid: verified.uid,
            email: verified.email,
            name: verified.name,
        })
        .await
    }

    pub async fn sign_up(&self, payload: &SignUpPayload) -> Result<IssuedSession> {
        payload.validate()?;
        if payload.name.trim().is_empty() {
            return Err(Error::BadRequest("Name is required".to_string()));
        }

        let created = self
            .identity
            .create_account(NewAccount {
                email: payload.email.trim().to_string(),
                password: payload.password.clone(),
                display_name: Some(payload.display_name()),
            })
            .await?;
        tracing::info!(uid = %created.uid, "Registered email/password account");

        self.open_session(LoginIdentity {
            uid: created.uid,
            email: created.email,
            name: created.display_name,
        })
        .await
    }

    async fn open_session(&self, identity: LoginIdentity) -> Result<IssuedSession> {
        let user = self.users.sync_login(&identity).await?;
        let issued = self.sessions.issue(&user)?;
        tracing::info!(
            uid = %user.uid,
            roles = ?user.roles.to_strings(),
            expires_at = %issued.expires_at,
            "Session issued"
        );
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::users::MockUserStore;
    use crate::models::role::{Role, RoleSet};
    use crate::models::user::User;
    use crate::services::identity_provider::{
        CreatedAccount, MockIdentityProvider, VerifiedIdentity,
    };
    use chrono::Utc;

    const SECRET: &str = "test-secret-0123456789";

    fn stored(identity: &LoginIdentity, roles: RoleSet) -> User {
        let now = Utc::now();
        User {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            roles,
            created_at: now,
            last_login_at: now,
        }
    }

    fn service(identity: MockIdentityProvider, users: MockUserStore) -> AuthService {
        AuthService::new(
            Arc::new(identity),
            Arc::new(users),
            SessionSigner::new(SECRET),
        )
    }

    #[tokio::test]
    async fn verified_assertion_yields_session_with_stored_roles() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_verify_id_token()
            .withf(|token| token == "provider-token")
            .times(1)
            .returning(|_| {
                Ok(VerifiedIdentity {
                    uid: "u1".into(),
                    email: "ana@example.com".into(),
                    name: Some("Ana".into()),
                })
            });

        let mut users = MockUserStore::new();
        users
            .expect_sync_login()
            .withf(|i| i.uid == "u1" && i.email == "ana@example.com")
            .times(1)
            .returning(|i| Ok(stored(i, RoleSet::from_iter([Role::User, Role::Admin]))));

        let auth = service(identity, users);
        let issued = auth.sign_in(" provider-token ").await.unwrap();

        let claims = auth.sessions().verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(claims.has_any_role(&[Role::Admin]));
    }

    #[tokio::test]
    async fn rejected_assertion_writes_nothing() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_verify_id_token()
            .returning(|_| Err(Error::Unauthorized("bad token".into())));
        let mut users = MockUserStore::new();
        users.expect_sync_login().never();

        let err = service(identity, users).sign_in("forged").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }

    #[tokio::test]
    async fn blank_token_is_a_bad_request() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_verify_id_token().never();

        let err = service(identity, MockUserStore::new())
            .sign_in("   ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn sign_up_passes_trimmed_display_name_and_opens_session() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_account()
            .withf(|account| {
                account.email == "ana@example.com"
                    && account.display_name.as_deref() == Some("Ana Souza")
            })
            .times(1)
            .returning(|account| {
                Ok(CreatedAccount {
                    uid: "new-uid".into(),
                    email: account.email,
                    display_name: account.display_name,
                })
            });
        let mut users = MockUserStore::new();
        users
            .expect_sync_login()
            .times(1)
            .returning(|i| Ok(stored(i, RoleSet::initial())));

        let payload = SignUpPayload {
            email: "ana@example.com".into(),
            password: "long-enough".into(),
            name: " Ana".into(),
            surname: Some("Souza ".into()),
        };
        let issued = service(identity, users).sign_up(&payload).await.unwrap();
        assert_eq!(issued.claims.sub, "new-uid");
        assert_eq!(issued.claims.name.as_deref(), Some("Ana Souza"));
        assert_eq!(issued.claims.roles, RoleSet::initial());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_and_writes_nothing() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_create_account()
            .returning(|_| Err(Error::Conflict("This email is already in use".into())));
        let mut users = MockUserStore::new();
        users.expect_sync_login().never();

        let payload = SignUpPayload {
            email: "ana@example.com".into(),
            password: "long-enough".into(),
            name: "Ana".into(),
            surname: None,
        };
        let err = service(identity, users).sign_up(&payload).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_sign_up_never_reaches_the_provider() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_create_account().never();

        let payload = SignUpPayload {
            email: "ana@example.com".into(),
            password: "short".into(),
            name: "Ana".into(),
            surname: None,
        };
        let err = service(identity, MockUserStore::new())
            .sign_up(&payload)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
