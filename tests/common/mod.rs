#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tower::ServiceExt;

use storefront_backend::{
    database::{MemoryProductStore, MemoryUserStore, UserStore},
    error::{Error, Result},
    models::{product::ImageRef, role::Role, user::User},
    routes,
    services::{
        identity_provider::{CreatedAccount, IdentityProvider, NewAccount, VerifiedIdentity},
        image_host::{ImageHost, ImageUpload},
        session::SessionSigner,
    },
    AppState,
};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const MAX_IMAGE_BYTES: usize = 64 * 1024;

/// Accepts tokens shaped `valid:<uid>:<email>`.
#[derive(Default)]
pub struct FakeIdentityProvider {
    registered: Mutex<HashSet<String>>,
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity> {
        let mut parts = id_token.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some("valid"), Some(uid), Some(email)) => Ok(VerifiedIdentity {
                uid: uid.to_string(),
                email: email.to_string(),
                name: None,
            }),
            _ => Err(Error::Unauthorized("Invalid or expired identity token".into())),
        }
    }

    async fn create_account(&self, account: NewAccount) -> Result<CreatedAccount> {
        let mut registered = self.registered.lock().unwrap();
        if !registered.insert(account.email.clone()) {
            return Err(Error::Conflict("This email is already in use".into()));
        }
        Ok(CreatedAccount {
            uid: format!("uid-{}", account.email),
            email: account.email,
            display_name: account.display_name,
        })
    }
}

#[derive(Default)]
pub struct FakeImageHost {
    pub uploads: AtomicUsize,
    pub failing: AtomicBool,
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload(&self, image: ImageUpload) -> Result<ImageRef> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Upstream("image host unavailable".into()));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ImageRef {
            url: format!("https://img.example/{}/{}", n, image.file_name),
            public_id: format!("nossa-tenda-produtos/{}", n),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub products: Arc<MemoryProductStore>,
    pub images: Arc<FakeImageHost>,
    pub sessions: SessionSigner,
}

pub fn test_app() -> TestApp {
    let users = Arc::new(MemoryUserStore::new());
    let products = Arc::new(MemoryProductStore::new());
    let images = Arc::new(FakeImageHost::default());
    let sessions = SessionSigner::new(JWT_SECRET);

    let state = AppState::from_parts(
        Arc::new(FakeIdentityProvider::default()),
        images.clone(),
        users.clone(),
        products.clone(),
        sessions.clone(),
        MAX_IMAGE_BYTES,
    );

    TestApp {
        router: routes::router(state),
        users,
        products,
        images,
        sessions,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, body)
    }

    pub async fn sign_in(&self, uid: &str) -> (StatusCode, JsonValue) {
        self.send(json_request(
            "/api/auth/google-signin",
            serde_json::json!({ "idToken": format!("valid:{}:{}@example.com", uid, uid) }),
        ))
        .await
    }

    /// Signs `uid` in, grants admin, and returns a fresh token carrying it.
    pub async fn admin_token(&self, uid: &str) -> String {
        self.sign_in(uid).await;
        assert!(self.users.grant(uid, Role::Admin).unwrap());
        let (_, body) = self.sign_in(uid).await;
        body["sessionToken"].as_str().unwrap().to_string()
    }

    pub async fn user_token(&self, uid: &str) -> String {
        let (_, body) = self.sign_in(uid).await;
        body["sessionToken"].as_str().unwrap().to_string()
    }

    pub async fn token_issued_at(&self, uid: &str, issued_at: DateTime<Utc>) -> String {
        let user: User = self.users.find(uid).await.unwrap().unwrap();
        self.sessions.issue_at(&user, issued_at).unwrap().token
    }
}

pub fn json_request(uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub struct ImagePart<'a> {
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

const BOUNDARY: &str = "storefront-test-boundary";

pub fn multipart_request(
    token: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<ImagePart<'_>>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(image) = image {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, image.file_name, image.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(image.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}
