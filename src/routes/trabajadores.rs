use actix_identity::Identity;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::NaiveDate;

use crate::{
    db,
    errors::AppError,
    listado::{Collection, ListQuery},
    routes::{require, required_text},
    structs::TrabajadorForm,
    AppState,
};

/// Checks a worker form against the field rules and the known
/// departments/occupations. Runs before any write.
async fn validate(state: &AppState, form: &TrabajadorForm) -> Result<(), AppError> {
    required_text(&form.nombres, "nombres")?;
    required_text(&form.apellidos, "apellidos")?;
    let email = required_text(&form.email, "email")?;
    if !email.contains('@') {
        return Err(AppError::validation("Invalid email address"));
    }
    if !(1..=9999).contains(&form.ropera) {
        return Err(AppError::validation("ropera must be between 1 and 9999"));
    }
    NaiveDate::parse_from_str(form.fecha_contratacion.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::validation("fecha_contratacion must be a YYYY-MM-DD date")
    })?;

    let departamento = required_text(&form.departamento, "departamento")?;
    if !db::department_exists(&state.db_pool, &departamento).await? {
        return Err(AppError::validation(format!(
            "Unknown departamento '{}'",
            departamento
        )));
    }
    let ocupacion = required_text(&form.ocupacion, "ocupacion")?;
    if !db::occupation_exists(&state.db_pool, &ocupacion).await? {
        return Err(AppError::validation(format!(
            "Unknown ocupacion '{}'",
            ocupacion
        )));
    }
    Ok(())
}

#[get("/trabajadores")]
pub async fn list_handler(
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_ver").await?;
    let workers = Collection::new(db::get_all_workers(&state.db_pool).await?);
    Ok(HttpResponse::Ok().json(workers.page(&query)))
}

#[get("/trabajadores/{id}")]
pub async fn get_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_ver").await?;
    let worker = db::get_worker_by_id(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(worker))
}

#[post("/trabajadores")]
pub async fn create_handler(
    web::Json(form): web::Json<TrabajadorForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_crear").await?;
    validate(&state, &form).await?;
    let worker = db::create_worker(&state.db_pool, &form).await?;
    Ok(HttpResponse::Created().json(worker))
}

#[put("/trabajadores/{id}")]
pub async fn update_handler(
    path: web::Path<i64>,
    web::Json(form): web::Json<TrabajadorForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_editar").await?;
    validate(&state, &form).await?;
    let worker = db::update_worker(&state.db_pool, path.into_inner(), &form).await?;
    Ok(HttpResponse::Ok().json(worker))
}

#[delete("/trabajadores/{id}")]
pub async fn delete_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "trabajadores_eliminar").await?;
    db::delete_worker(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
