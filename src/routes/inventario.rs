use actix_identity::Identity;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

use crate::{
    db,
    errors::AppError,
    listado::{Collection, ListQuery},
    routes::{require, required_text},
    structs::InventarioForm,
    AppState,
};

fn validate(form: &InventarioForm) -> Result<(), AppError> {
    required_text(&form.nombre, "nombre")?;
    if form.cantidad < 0 {
        return Err(AppError::validation("cantidad cannot be negative"));
    }
    Ok(())
}

#[get("/inventario")]
pub async fn list_handler(
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "inventario_ver").await?;
    let items = Collection::new(db::get_all_inventory(&state.db_pool).await?);
    Ok(HttpResponse::Ok().json(items.page(&query)))
}

#[post("/inventario")]
pub async fn create_handler(
    web::Json(form): web::Json<InventarioForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "inventario_crear").await?;
    validate(&form)?;
    let item = db::create_inventory_item(&state.db_pool, &form).await?;
    Ok(HttpResponse::Created().json(item))
}

#[put("/inventario/{id}")]
pub async fn update_handler(
    path: web::Path<i64>,
    web::Json(form): web::Json<InventarioForm>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "inventario_editar").await?;
    validate(&form)?;
    let item = db::update_inventory_item(&state.db_pool, path.into_inner(), &form).await?;
    Ok(HttpResponse::Ok().json(item))
}

#[delete("/inventario/{id}")]
pub async fn delete_handler(
    path: web::Path<i64>,
    state: web::Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    require(&state, identity, "inventario_eliminar").await?;
    db::delete_inventory_item(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::test_support::{memory_pool, owner_session, session_cookie, test_app};

    #[actix_web::test]
    async fn items_are_listed_searched_and_updated() {
        let app = test_app!(memory_pool().await);
        let owner = owner_session!(app);

        for (nombre, cantidad, ubicacion) in [
            ("Toner negro", 4, "Bodega"),
            ("Resma carta", 30, "Oficina"),
            ("Toner color", 1, "Bodega"),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/inventario")
                .cookie(owner.clone())
                .set_json(json!({ "nombre": nombre, "cantidad": cantidad, "ubicacion": ubicacion }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get()
            .uri("/api/inventario?busqueda=TONER&orden=cantidad")
            .cookie(owner.clone())
            .to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 2);
        assert_eq!(page["items"][0]["nombre"], "Toner color");
        let id = page["items"][0]["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri("/api/inventario?pagina=18446744073709551615")
            .cookie(owner.clone())
            .to_request();
        let page: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(page["total"], 3);
        assert_eq!(page["items"], json!([]));

        let req = test::TestRequest::put()
            .uri(&format!("/api/inventario/{}", id))
            .cookie(owner.clone())
            .set_json(json!({ "nombre": "Toner color", "cantidad": 6, "ubicacion": "Bodega" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["cantidad"], 6);

        let req = test::TestRequest::put()
            .uri(&format!("/api/inventario/{}", id))
            .cookie(owner)
            .set_json(json!({ "nombre": "Toner color", "cantidad": -1 }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn employee_without_grant_is_forbidden() {
        let app = test_app!(memory_pool().await);
        let owner = owner_session!(app);

        let req = test::TestRequest::post()
            .uri("/api/auth/registro")
            .cookie(owner)
            .set_json(json!({
                "email": "beto@example.com",
                "nombre": "Beto",
                "password": "beto-pass-1234!",
                "password2": "beto-pass-1234!"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "beto@example.com", "password": "beto-pass-1234!" }))
            .to_request();
        let beto = session_cookie(&test::call_service(&app, req).await);

        let req = test::TestRequest::get()
            .uri("/api/inventario")
            .cookie(beto)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("inventario_ver"));
    }
}
