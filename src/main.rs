#[macro_use]
extern crate lazy_static;
use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};

use std::{path::PathBuf, str::FromStr};
use tera::Tera;

use actix_files::{Files, NamedFile};
use actix_web::{
    http::Method,
    middleware,
    web::{self, Data},
    App, Either, HttpRequest, HttpResponse, HttpServer, Responder,
};
use log::info;
use serde_json::json;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};

mod calculo;
mod config;
mod dashboard;
mod db;
mod errors;
mod exportar;
mod listado;
mod permisos;
mod routes;
mod structs;
#[cfg(test)]
mod test_support;
mod utils;

use config::Config;
use errors::AppError;

#[derive(Debug, Clone)]
pub struct AppState {
    db_pool: SqlitePool,
    fonts_dir: PathBuf,
    static_dir: PathBuf,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        if let Err(e) = tera.add_raw_template("reporte.html", include_str!("../templates/reporte.html")) {
            log::error!("Parsing error(s): {}", e);
            ::std::process::exit(1);
        }
        tera.autoescape_on(vec![".html"]);
        tera
    };
}

async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts).await?;
    sqlx::migrate!().run(&db_pool).await?;
    info!("Database migrated successfully");
    Ok(db_pool)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("FATAL: {}", e);
        e
    })?;

    let db_pool = connect(&config.database_url).await.map_err(|e| {
        log::error!("FATAL: could not open {}: {}", config.database_url, e);
        e
    })?;

    let state = AppState {
        db_pool,
        fonts_dir: config.fonts_dir.clone(),
        static_dir: config.static_dir.clone(),
    };
    let key = config.cookie_key();
    let static_dir = config.static_dir.clone();

    info!(
        "Starting HTTP server on http://{}:{}/",
        config.bind_addr, config.port
    );

    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                key.clone(),
            ))
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .app_data(Data::new(state.clone()))
            .configure(routes::configure)
            .service(Files::new("/static", &static_dir))
            .default_service(web::to(default_handler))
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}

/// Unknown API paths get a JSON 404; any other GET falls through to the
/// frontend's index.html so client-side routes survive a reload.
async fn default_handler(
    req: HttpRequest,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if req.path().starts_with("/api") {
        return Ok(Either::Right(
            HttpResponse::NotFound().json(json!({ "error": "Not found" })),
        ));
    }
    match *req.method() {
        Method::GET => {
            let file = NamedFile::open(state.static_dir.join("index.html"))
                .map_err(|_| AppError::NotFound)?;
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
