use actix_identity::Identity;
use actix_web::{get, put, web, HttpResponse, Responder};
use serde::Deserialize;

use crate::{
    db,
    errors::AppError,
    permisos::{
        is_owner, validate_capabilities, DbModuleSource, Module, ModuleAccess, ModuleSource,
        PermissionState,
    },
    routes::{current_user, require},
    AppState,
};

/// The caller's flat permission set, resolved once here for the frontend.
#[get("/permisos")]
pub async fn resolved_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = current_user(&state, identity).await?;
    let source = DbModuleSource {
        pool: &state.db_pool,
    };
    let mut permissions = PermissionState::default();
    permissions.refresh(Some(&user), &source).await;
    Ok(HttpResponse::Ok().json(permissions))
}

#[get("/permisos/modulos/{modulo}")]
pub async fn module_handler(
    path: web::Path<String>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let module = Module::parse(&path.into_inner()).ok_or(AppError::NotFound)?;
    let user = current_user(&state, identity).await?;

    let access = if is_owner(&user) {
        ModuleAccess {
            has_access: true,
            permissions: module.capabilities().map(str::to_owned).collect(),
        }
    } else {
        DbModuleSource {
            pool: &state.db_pool,
        }
        .check(user.id, module)
        .await?
    };
    Ok(HttpResponse::Ok().json(access))
}

#[derive(Deserialize, Debug)]
pub struct GrantsForm {
    pub permissions: Vec<String>,
}

#[put("/permisos/usuarios/{id}/{modulo}")]
pub async fn set_grants_handler(
    path: web::Path<(i64, String)>,
    web::Json(form): web::Json<GrantsForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "usuarios").await?;
    let (usuario_id, modulo) = path.into_inner();
    let module = Module::parse(&modulo).ok_or(AppError::NotFound)?;
    validate_capabilities(module, &form.permissions)?;
    if db::get_user_by_id(&state.db_pool, usuario_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    db::set_module_grants(&state.db_pool, usuario_id, module, &form.permissions).await?;
    let access = DbModuleSource {
        pool: &state.db_pool,
    }
    .check(usuario_id, module)
    .await?;
    Ok(HttpResponse::Ok().json(access))
}
