use actix_web::{cookie::Cookie, dev::ServiceResponse};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::AppState;

/// Fresh, migrated in-memory database. One connection so every query sees
/// the same memory store.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    pool
}

pub fn state(pool: SqlitePool) -> AppState {
    AppState {
        db_pool: pool,
        fonts_dir: "/nonexistent/fonts".into(),
        static_dir: "/nonexistent/static".into(),
    }
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
        .expect("session cookie")
}

/// Builds the full app (session + identity middleware and all routes) around a pool.
macro_rules! test_app {
    ($pool:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_identity::IdentityMiddleware::default())
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::from(&[7u8; 64][..]),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .app_data(actix_web::web::Data::new($crate::test_support::state($pool)))
                .configure($crate::routes::configure),
        )
        .await
    };
}

/// Registers the bootstrap owner account and returns its session cookie.
macro_rules! owner_session {
    ($app:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/auth/registro")
            .set_json(serde_json::json!({
                "email": "owner@example.com",
                "nombre": "Owner",
                "password": "owner-pass-123!",
                "password2": "owner-pass-123!"
            }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        $crate::test_support::session_cookie(&resp)
    }};
}

pub(crate) use owner_session;
pub(crate) use test_app;
