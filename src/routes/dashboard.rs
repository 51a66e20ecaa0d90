use actix_identity::Identity;
use actix_web::{get, http::header, web, HttpResponse, Responder};

use crate::{
    calculo,
    dashboard::{build_stats, DashboardStats},
    db,
    errors::AppError,
    exportar,
    routes::require,
    structs::FotocopiaDetalle,
    AppState,
};

async fn load(state: &AppState) -> Result<(DashboardStats, Vec<FotocopiaDetalle>), AppError> {
    let workers = db::get_all_workers(&state.db_pool).await?;
    let records = db::get_all_photocopies(&state.db_pool).await?;
    let prices = db::get_prices(&state.db_pool).await?;
    let inventory = db::get_all_inventory(&state.db_pool).await?;

    let stats = build_stats(&workers, &records, &prices, &inventory);
    let detail = records.into_iter().map(calculo::detail).collect();
    Ok((stats, detail))
}

fn attachment(extension: &str) -> (header::HeaderName, String) {
    let day = chrono::Utc::now().format("%Y-%m-%d");
    (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"reporte-{}.{}\"", day, extension),
    )
}

#[get("/dashboard/estadisticas")]
pub async fn stats_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "graficos").await?;
    let (stats, _) = load(&state).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/dashboard/exportar/excel")]
pub async fn excel_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = require(&state, identity, "graficos").await?;
    let (stats, records) = load(&state).await?;
    let bytes = web::block(move || exportar::to_xlsx(&stats, &records))
        .await
        .map_err(|e| AppError::Export(e.to_string()))??;
    log::info!("User {} exported the dashboard to Excel", user.id);
    Ok(HttpResponse::Ok()
        .content_type(exportar::XLSX_CONTENT_TYPE)
        .insert_header(attachment("xlsx"))
        .body(bytes))
}

#[get("/dashboard/exportar/pdf")]
pub async fn pdf_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    let user = require(&state, identity, "graficos").await?;
    let (stats, _) = load(&state).await?;
    let fonts_dir = state.fonts_dir.clone();
    let bytes = web::block(move || exportar::to_pdf(&stats, &fonts_dir))
        .await
        .map_err(|e| AppError::Export(e.to_string()))??;
    log::info!("User {} exported the dashboard to PDF", user.id);
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(attachment("pdf"))
        .body(bytes))
}

/// Printable HTML version of the dashboard.
#[get("/dashboard/reporte")]
pub async fn report_handler(
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "graficos").await?;
    let (stats, _) = load(&state).await?;
    let html = exportar::to_html(&stats)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::test_support::{memory_pool, owner_session, test_app};

    #[actix_web::test]
    async fn stats_and_exports() {
        let app = test_app!(memory_pool().await);
        let owner = owner_session!(app);

        let req = test::TestRequest::post()
            .uri("/api/fotocopias")
            .cookie(owner.clone())
            .set_json(json!({ "cantidad": 9, "multiplicador": 10, "tipo": "bn", "doble_hoja": true }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri("/api/dashboard/estadisticas")
            .cookie(owner.clone())
            .to_request();
        let stats: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stats["fotocopias"]["paginas_bn"], 90);
        assert_eq!(stats["fotocopias"]["hojas"], 50);
        assert_eq!(stats["fotocopias_por_mes"]["labels"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/dashboard/exportar/excel")
            .cookie(owner.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_owned();
        assert!(disposition.starts_with("attachment; filename=\"reporte-"));
        let body = test::read_body(resp).await;
        assert_eq!(&body[..2], b"PK");

        let req = test::TestRequest::get()
            .uri("/api/dashboard/reporte")
            .cookie(owner.clone())
            .to_request();
        let html = test::call_and_read_body(&app, req).await;
        assert!(std::str::from_utf8(&html).unwrap().contains("<table"));

        // the test state points at a missing fonts directory
        let req = test::TestRequest::get()
            .uri("/api/dashboard/exportar/pdf")
            .cookie(owner)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn anonymous_caller_gets_401() {
        let app = test_app!(memory_pool().await);
        let req = test::TestRequest::get()
            .uri("/api/dashboard/estadisticas")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
