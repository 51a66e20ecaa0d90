use actix_identity::Identity;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use crate::{
    db,
    errors::AppError,
    routes::{require, required_text},
    structs::{DepartamentoForm, OcupacionForm},
    AppState,
};

// Departments and occupations are the lookup tables behind worker forms,
// so they share the worker module's tokens.

#[get("/departamentos")]
pub async fn list_departments_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_ver").await?;
    let rows = db::get_all_departments(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[post("/departamentos")]
pub async fn create_department_handler(
    web::Json(form): web::Json<DepartamentoForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_crear").await?;
    let nombre = required_text(&form.nombre, "nombre")?;
    let row = db::create_department(&state.db_pool, &nombre).await?;
    Ok(HttpResponse::Created().json(row))
}

#[put("/departamentos/{id}")]
pub async fn update_department_handler(
    path: web::Path<i64>,
    web::Json(form): web::Json<DepartamentoForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_editar").await?;
    let nombre = required_text(&form.nombre, "nombre")?;
    let row = db::update_department(&state.db_pool, path.into_inner(), &nombre).await?;
    Ok(HttpResponse::Ok().json(row))
}

#[delete("/departamentos/{id}")]
pub async fn delete_department_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_eliminar").await?;
    db::delete_department(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/ocupaciones")]
pub async fn list_occupations_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_ver").await?;
    let rows = db::get_all_occupations(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[post("/ocupaciones")]
pub async fn create_occupation_handler(
    web::Json(form): web::Json<OcupacionForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_crear").await?;
    let nombre = required_text(&form.nombre, "nombre")?;
    let row = db::create_occupation(&state.db_pool, &nombre, form.departamento_id).await?;
    Ok(HttpResponse::Created().json(row))
}

#[put("/ocupaciones/{id}")]
pub async fn update_occupation_handler(
    path: web::Path<i64>,
    web::Json(form): web::Json<OcupacionForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_editar").await?;
    let nombre = required_text(&form.nombre, "nombre")?;
    let row = db::update_occupation(
        &state.db_pool,
        path.into_inner(),
        &nombre,
        form.departamento_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(row))
}

#[delete("/ocupaciones/{id}")]
pub async fn delete_occupation_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_eliminar").await?;
    db::delete_occupation(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
