use actix_identity::Identity;
use actix_web::{get, post, web, HttpMessage, HttpRequest, HttpResponse, Responder};

use crate::{
    db,
    errors::AppError,
    permisos::OWNER_ROLE,
    routes::{current_user, require, required_text},
    structs::{LoginForm, RegistroForm},
    utils, AppState,
};

/// Registration. The very first account bootstraps the system as owner and
/// is signed in; after that only holders of `usuarios` may add accounts.
#[post("/auth/registro")]
pub async fn registro_handler(
    web::Json(form): web::Json<RegistroForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    let email = required_text(&form.email, "email")?.to_lowercase();
    let nombre = required_text(&form.nombre, "nombre")?;
    if !email.contains('@') {
        return Err(AppError::validation("Invalid email address"));
    }
    if form.password != form.password2 {
        return Err(AppError::validation("Passwords do not match"));
    }
    utils::check_password_strength(&form.password)?;

    if db::count_users(&state.db_pool).await? == 0 {
        if let Some(user) =
            db::create_first_owner(&state.db_pool, &email, &nombre, &form.password).await?
        {
            Identity::login(&request.extensions(), user.id.to_string())?;
            log::info!("Bootstrap owner account {} created", user.id);
            return Ok(HttpResponse::Created().json(user));
        }
    }

    require(&state, identity, "usuarios").await?;
    let rol = form
        .rol
        .as_deref()
        .and_then(utils::trimmed)
        .unwrap_or_else(|| "empleado".to_owned());
    let es_propietario = rol == OWNER_ROLE;
    let user = db::create_user(
        &state.db_pool,
        &email,
        &nombre,
        &form.password,
        &rol,
        es_propietario,
    )
    .await?;
    Ok(HttpResponse::Created().json(user))
}

#[post("/auth/login")]
pub async fn login_handler(
    web::Json(form): web::Json<LoginForm>,
    state: web::Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(AppError::validation("All fields are required"));
    }
    let lc_email = form.email.trim().to_lowercase();

    let Some(user) = db::get_user_by_email(&state.db_pool, &lc_email).await? else {
        return Err(AppError::Unauthorized);
    };
    if !user.activo || !utils::verify_password(&form.password, &user.pwd_hash)? {
        log::warn!("Failed login for {}", lc_email);
        return Err(AppError::Unauthorized);
    }

    Identity::login(&request.extensions(), user.id.to_string())?;
    log::info!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(user))
}

#[post("/auth/logout")]
pub async fn logout_handler(identity: Option<Identity>) -> impl Responder {
    if let Some(user) = identity {
        user.logout();
    }
    HttpResponse::NoContent()
}

#[get("/auth/yo")]
pub async fn yo_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = current_user(&state, identity).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::test_support::{memory_pool, owner_session, test_app};

    #[actix_web::test]
    async fn first_account_is_owner_and_signed_in() {
        let app = test_app!(memory_pool().await);
        let cookie = owner_session!(app);

        let req = test::TestRequest::get()
            .uri("/api/auth/yo")
            .cookie(cookie)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["email"], "owner@example.com");
        assert_eq!(body["es_propietario"], true);
        assert!(body.get("pwd_hash").is_none());
    }

    #[actix_web::test]
    async fn later_registration_needs_usuarios() {
        let app = test_app!(memory_pool().await);
        let _owner = owner_session!(app);

        let req = test::TestRequest::post()
            .uri("/api/auth/registro")
            .set_json(json!({
                "email": "intruso@example.com",
                "nombre": "Intruso",
                "password": "abcdefgh123!",
                "password2": "abcdefgh123!"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn weak_password_is_rejected_before_any_write() {
        let app = test_app!(memory_pool().await);
        let req = test::TestRequest::post()
            .uri("/api/auth/registro")
            .set_json(json!({
                "email": "owner@example.com",
                "nombre": "Owner",
                "password": "short",
                "password2": "short"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn login_checks_password() {
        let app = test_app!(memory_pool().await);
        let _owner = owner_session!(app);

        let bad = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "OWNER@example.com", "password": "wrong-pass-123!" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, bad).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let good = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "OWNER@example.com", "password": "owner-pass-123!" }))
            .to_request();
        let resp = test::call_service(&app, good).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn anonymous_requests_are_unauthorized() {
        let app = test_app!(memory_pool().await);
        let req = test::TestRequest::get().uri("/api/auth/yo").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
