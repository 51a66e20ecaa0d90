use actix_identity::Identity;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::NaiveDate;

use crate::{
    calculo, db,
    errors::AppError,
    listado::{Collection, ListQuery},
    routes::{current_user, require, required_text},
    structs::{
        CalculoForm, FotocopiaDetalle, FotocopiaForm, PrecioConfig, RangoFechas, TipoHojaForm,
    },
    AppState,
};

async fn validate(state: &AppState, form: &FotocopiaForm) -> Result<(), AppError> {
    if !(1..=calculo::MAX_CANTIDAD).contains(&form.cantidad) {
        return Err(AppError::validation(format!(
            "cantidad must be between 1 and {}",
            calculo::MAX_CANTIDAD
        )));
    }
    if form
        .multiplicador
        .is_some_and(|m| !(1..=calculo::MAX_MULTIPLICADOR).contains(&m))
    {
        return Err(AppError::validation(format!(
            "multiplicador must be between 1 and {}",
            calculo::MAX_MULTIPLICADOR
        )));
    }
    if let Some(id) = form.tipo_hoja_id {
        if !db::sheet_type_exists(&state.db_pool, id).await? {
            return Err(AppError::validation(format!("Unknown tipo_hoja_id {}", id)));
        }
    }
    Ok(())
}

fn parse_day(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::validation(format!("{} must be a YYYY-MM-DD date", field))),
    }
}

/// Live sheet estimate for the entry form. Accepts whatever the form
/// currently holds; blank or garbage numbers fall back to defaults.
#[post("/fotocopias/calcular")]
pub async fn calcular_handler(
    web::Json(form): web::Json<CalculoForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    current_user(&state, identity).await?;
    Ok(HttpResponse::Ok().json(calculo::estimate(&form)))
}

#[get("/fotocopias/resumen")]
pub async fn resumen_handler(
    query: web::Query<RangoFechas>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_ver").await?;
    let desde = parse_day(query.desde.as_deref(), "desde")?;
    let hasta = parse_day(query.hasta.as_deref(), "hasta")?;
    if let (Some(d), Some(h)) = (desde, hasta) {
        if d > h {
            return Err(AppError::validation("desde must not be after hasta"));
        }
    }

    let desde = desde.map(|d| d.format("%Y-%m-%d").to_string());
    let hasta = hasta.map(|d| d.format("%Y-%m-%d").to_string());
    let records =
        db::get_photocopies_between(&state.db_pool, desde.as_deref(), hasta.as_deref()).await?;
    let prices = db::get_prices(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(calculo::calculate_cost(&records, &prices)))
}

#[get("/fotocopias")]
pub async fn list_handler(
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_ver").await?;
    let rows: Vec<FotocopiaDetalle> = db::get_all_photocopies(&state.db_pool)
        .await?
        .into_iter()
        .map(calculo::detail)
        .collect();
    Ok(HttpResponse::Ok().json(Collection::new(rows).page(&query)))
}

#[post("/fotocopias")]
pub async fn create_handler(
    web::Json(form): web::Json<FotocopiaForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = require(&state, identity, "fotocopias_crear").await?;
    validate(&state, &form).await?;
    let row = db::create_photocopy(&state.db_pool, &form, user.id).await?;
    Ok(HttpResponse::Created().json(calculo::detail(row)))
}

#[put("/fotocopias/{id}")]
pub async fn update_handler(
    path: web::Path<i64>,
    web::Json(form): web::Json<FotocopiaForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_editar").await?;
    validate(&state, &form).await?;
    let row = db::update_photocopy(&state.db_pool, path.into_inner(), &form).await?;
    Ok(HttpResponse::Ok().json(calculo::detail(row)))
}

#[delete("/fotocopias/{id}")]
pub async fn delete_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_eliminar").await?;
    db::delete_photocopy(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/tipos-hoja")]
pub async fn list_sheet_types_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_ver").await?;
    let rows = db::get_all_sheet_types(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[post("/tipos-hoja")]
pub async fn create_sheet_type_handler(
    web::Json(form): web::Json<TipoHojaForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_crear").await?;
    let nombre = required_text(&form.nombre, "nombre")?;
    let descripcion = form.descripcion.as_deref().and_then(crate::utils::trimmed);
    let row = db::create_sheet_type(&state.db_pool, &nombre, descripcion.as_deref()).await?;
    Ok(HttpResponse::Created().json(row))
}

#[delete("/tipos-hoja/{id}")]
pub async fn delete_sheet_type_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_eliminar").await?;
    db::delete_sheet_type(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/configuracion/precios")]
pub async fn get_prices_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "fotocopias_ver").await?;
    Ok(HttpResponse::Ok().json(db::get_prices(&state.db_pool).await?))
}

#[put("/configuracion/precios")]
pub async fn update_prices_handler(
    web::Json(prices): web::Json<PrecioConfig>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "configuracion").await?;
    let amounts = [prices.precio_bn, prices.precio_color, prices.precio_hoja];
    if amounts.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(AppError::validation("Prices must be non-negative numbers"));
    }
    if prices.fotocopia_gracia_bn < 0 || prices.fotocopia_gracia_color < 0 {
        return Err(AppError::validation("Grace allowances must be non-negative"));
    }
    let saved = db::update_prices(&state.db_pool, &prices).await?;
    Ok(HttpResponse::Ok().json(saved))
}
