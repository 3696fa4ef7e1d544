mod support;

use anyhow::{bail, Result};
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use edurag::{
    api::{ApiClient, ApiError},
    auth::{AuthError, AuthFlow},
    session::{
        CredentialStore, Decision, FileCredentialStore, Role, RouteGuard, RoutePolicy,
        SessionReader,
    },
};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{collections::BTreeSet, sync::Arc};
use support::{serve, token};
use url::Url;

struct Fixture {
    api: ApiClient,
    store: Arc<dyn CredentialStore>,
    _dir: tempfile::TempDir,
}

impl Fixture {
    fn new(api_url: Url) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(dir.path(), &api_url));
        Ok(Self {
            api: ApiClient::new(api_url)?,
            store,
            _dir: dir,
        })
    }

    fn flow(&self) -> AuthFlow {
        AuthFlow::new(self.api.clone(), Arc::clone(&self.store))
    }

    fn reader(&self) -> SessionReader {
        SessionReader::new(Arc::clone(&self.store))
    }

    fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.reader(), RoutePolicy::default())
    }
}

fn password() -> SecretString {
    SecretString::from("correct horse".to_string())
}

/// Issues a token for `role` and records every request body.
async fn auth_server(role: &'static str) -> Result<(Url, Arc<Mutex<Vec<Value>>>)> {
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let login_bodies = Arc::clone(&bodies);
    let register_bodies = Arc::clone(&bodies);
    let issued = token(&json!({"sub": "1", "role": role, "email": "a@b.com"}))?;
    let issued_login = issued.clone();

    let app = Router::new()
        .route(
            "/auth/login",
            post(move |Json(body): Json<Value>| {
                let bodies = Arc::clone(&login_bodies);
                let issued = issued_login.clone();
                async move {
                    bodies.lock().push(body);
                    Json(json!({"access_token": issued, "token_type": "bearer"}))
                }
            }),
        )
        .route(
            "/auth/register",
            post(move |Json(body): Json<Value>| {
                let bodies = Arc::clone(&register_bodies);
                let issued = issued.clone();
                async move {
                    bodies.lock().push(body);
                    Json(json!({"access_token": issued}))
                }
            }),
        )
        .route(
            "/forms",
            get(|headers: HeaderMap| async move {
                match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
                    Some(value) if value.starts_with("Bearer ") => {
                        (StatusCode::OK, Json(json!([{"id": 1, "title": "Thermodynamics"}])))
                    }
                    _ => (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"detail": "Not authenticated"})),
                    ),
                }
            }),
        );
    Ok((serve(app).await?, bodies))
}

#[tokio::test]
async fn tutor_login_end_to_end() -> Result<()> {
    let (api_url, bodies) = auth_server("tutor").await?;
    let fixture = Fixture::new(api_url)?;

    let landing = fixture.flow().login(" a@b.com ", &password()).await?;
    assert_eq!(landing.role, Role::Tutor);
    assert_eq!(landing.path, "/tutor");
    assert_eq!(
        *bodies.lock(),
        vec![json!({"email": "a@b.com", "password": "correct horse"})]
    );

    let reader = fixture.reader();
    assert_eq!(reader.role(), Role::Tutor);
    assert_eq!(reader.email().as_deref(), Some("a@b.com"));

    let guard = fixture.guard();
    let tutor_or_admin: BTreeSet<Role> = [Role::Tutor, Role::Admin].into_iter().collect();
    let student_only: BTreeSet<Role> = [Role::Student].into_iter().collect();
    assert!(guard.authorize(Some(&tutor_or_admin)).is_allowed());
    assert!(!guard.authorize(Some(&student_only)).is_allowed());

    fixture.flow().logout()?;
    fixture.flow().logout()?;
    assert_eq!(reader.role(), Role::Anonymous);
    assert!(!guard.check_page("/tutor/monitor").is_allowed());
    Ok(())
}

#[tokio::test]
async fn registration_requests_student_role() -> Result<()> {
    let (api_url, bodies) = auth_server("student").await?;
    let fixture = Fixture::new(api_url)?;

    let landing = fixture.flow().register("new@school.test", &password()).await?;
    assert_eq!(landing.role, Role::Student);
    assert_eq!(landing.path, "/ws");
    assert_eq!(
        bodies.lock()[0],
        json!({"email": "new@school.test", "password": "correct horse", "role": "student"})
    );
    assert!(fixture.guard().check_page("/student/exams/4").is_allowed());
    Ok(())
}

#[tokio::test]
async fn authenticated_request_needs_guarded_page() -> Result<()> {
    let (api_url, _bodies) = auth_server("student").await?;
    let fixture = Fixture::new(api_url)?;
    fixture.flow().login("a@b.com", &password()).await?;

    let Decision::Allow(access) = fixture.guard().check_page("/student") else {
        bail!("student area should be allowed");
    };
    let forms: Value = fixture.api.get_json(&access, "/forms").await?;
    assert_eq!(forms[0]["title"], "Thermodynamics");

    // Public pages never carry the credential.
    let Decision::Allow(public) = fixture.guard().check_page("/forms") else {
        bail!("public page should be allowed");
    };
    let result = fixture.api.get_json::<Value>(&public, "/forms").await;
    assert_eq!(result.err(), Some(ApiError::Unauthenticated));
    Ok(())
}

#[tokio::test]
async fn rejected_login_stores_nothing() -> Result<()> {
    let app = Router::new().route(
        "/auth/login",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid credentials"})),
            )
        }),
    );
    let fixture = Fixture::new(serve(app).await?)?;

    match fixture.flow().login("a@b.com", &password()).await {
        Err(AuthError::Api(ApiError::Http { status, message })) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => bail!("unexpected result: {other:?}"),
    }
    assert!(fixture.store.get().is_none());
    Ok(())
}

#[tokio::test]
async fn missing_access_token_is_an_error() -> Result<()> {
    let app = Router::new().route(
        "/auth/login",
        post(|| async { Json(json!({"token_type": "bearer"})) }),
    );
    let fixture = Fixture::new(serve(app).await?)?;

    let result = fixture.flow().login("a@b.com", &password()).await;
    assert!(matches!(result, Err(AuthError::Api(ApiError::MissingToken))));
    assert!(fixture.store.get().is_none());
    Ok(())
}

#[tokio::test]
async fn invalid_email_never_reaches_the_server() -> Result<()> {
    let (api_url, bodies) = auth_server("tutor").await?;
    let fixture = Fixture::new(api_url)?;

    let result = fixture.flow().login("not-an-email", &password()).await;
    assert!(matches!(result, Err(AuthError::Api(ApiError::InvalidEmail))));
    assert!(bodies.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn credential_survives_a_new_store_instance() -> Result<()> {
    let (api_url, _bodies) = auth_server("admin").await?;
    let dir = tempfile::tempdir()?;

    let first: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(dir.path(), &api_url));
    let landing = AuthFlow::new(ApiClient::new(api_url.clone())?, first)
        .login("a@b.com", &password())
        .await?;
    assert_eq!(landing.path, "/admin");

    let second: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(dir.path(), &api_url));
    assert_eq!(SessionReader::new(second).role(), Role::Admin);
    Ok(())
}
