use actix_identity::Identity;
use actix_web::web;

use crate::{
    db,
    errors::AppError,
    permisos::{DbModuleSource, PermissionState},
    structs::Usuario,
    AppState,
};

mod auth;
mod dashboard;
mod departamentos;
mod fotocopias;
mod inventario;
mod permisos;
mod trabajadores;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::validation(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .service(auth::registro_handler)
            .service(auth::login_handler)
            .service(auth::logout_handler)
            .service(auth::yo_handler)
            .service(permisos::resolved_handler)
            .service(permisos::module_handler)
            .service(permisos::set_grants_handler)
            .service(trabajadores::list_handler)
            .service(trabajadores::get_handler)
            .service(trabajadores::create_handler)
            .service(trabajadores::update_handler)
            .service(trabajadores::delete_handler)
            .service(departamentos::list_departments_handler)
            .service(departamentos::create_department_handler)
            .service(departamentos::update_department_handler)
            .service(departamentos::delete_department_handler)
            .service(departamentos::list_occupations_handler)
            .service(departamentos::create_occupation_handler)
            .service(departamentos::update_occupation_handler)
            .service(departamentos::delete_occupation_handler)
            .service(fotocopias::calcular_handler)
            .service(fotocopias::resumen_handler)
            .service(fotocopias::list_handler)
            .service(fotocopias::create_handler)
            .service(fotocopias::update_handler)
            .service(fotocopias::delete_handler)
            .service(fotocopias::list_sheet_types_handler)
            .service(fotocopias::create_sheet_type_handler)
            .service(fotocopias::delete_sheet_type_handler)
            .service(fotocopias::get_prices_handler)
            .service(fotocopias::update_prices_handler)
            .service(inventario::list_handler)
            .service(inventario::create_handler)
            .service(inventario::update_handler)
            .service(inventario::delete_handler)
            .service(dashboard::stats_handler)
            .service(dashboard::excel_handler)
            .service(dashboard::pdf_handler)
            .service(dashboard::report_handler),
    );
}

/// The signed-in, active account behind the session cookie.
pub async fn current_user(state: &AppState, identity: Option<Identity>) -> Result<Usuario, AppError> {
    let identity = identity.ok_or(AppError::Unauthorized)?;
    let id: i64 = identity
        .id()?
        .parse()
        .map_err(|_| AppError::Unauthorized)?;
    match db::get_user_by_id(&state.db_pool, id).await? {
        Some(user) if user.activo => Ok(user),
        _ => {
            identity.logout();
            Err(AppError::Unauthorized)
        }
    }
}

/// Route guard: resolves the caller's permissions and demands `token`.
pub async fn require(
    state: &AppState,
    identity: Option<Identity>,
    token: &str,
) -> Result<Usuario, AppError> {
    let user = current_user(state, identity).await?;
    let source = DbModuleSource {
        pool: &state.db_pool,
    };
    let mut permissions = PermissionState::default();
    permissions.refresh(Some(&user), &source).await;
    if !permissions.has(token) {
        log::warn!("User {} denied: missing '{}'", user.id, token);
        return Err(AppError::Forbidden(token.to_owned()));
    }
    Ok(user)
}

pub fn required_text(value: &str, field: &str) -> Result<String, AppError> {
    crate::utils::trimmed(value).ok_or_else(|| AppError::validation(format!("{} is required", field)))
}
