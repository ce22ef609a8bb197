#![deny(missing_docs)]
//! RepoInsight server executable.
//!
//! Hosts HTTP endpoints that analyze GitHub repositories and serve the
//! latest stored result.

mod db;
mod models;
mod openapi;
mod routes;
mod schema;
mod store;

#[cfg(not(test))]
use actix_cors::Cors;
#[cfg(not(test))]
use actix_web::{App, HttpServer, http::header, web};
#[cfg(not(test))]
use dotenvy::dotenv;
#[cfg(not(test))]
use log::{info, warn};
#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use repoinsight_core::{Analyzer, AnalyzerOptions, GitHubSource};

#[cfg(not(test))]
use crate::routes::{AppState, analyze_repository, health, latest_analysis, openapi_json};
#[cfg(not(test))]
use crate::store::{AnalysisStore, MemoryAnalysisStore, PgAnalysisStore};

#[cfg(not(test))]
fn invalid_config(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
}

#[cfg(not(test))]
fn build_store() -> std::io::Result<Arc<dyn AnalysisStore>> {
    match std::env::var("DATABASE_URL") {
        Ok(database_url) if !database_url.trim().is_empty() => {
            let store = PgAnalysisStore::connect(&database_url)
                .map_err(|err| std::io::Error::other(format!("database setup failed: {err}")))?;
            info!("storing analyses in PostgreSQL");
            Ok(Arc::new(store))
        }
        _ => {
            warn!("DATABASE_URL not set; analyses are kept in memory only");
            Ok(Arc::new(MemoryAnalysisStore::new()))
        }
    }
}

#[cfg(not(test))]
fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let source = GitHubSource::from_env()
        .map_err(|err| invalid_config(format!("GitHub client setup failed: {err}")))?;
    info!("using GitHub API at {}", source.api_url());
    let options = AnalyzerOptions::from_env().map_err(|err| invalid_config(err.to_string()))?;
    let state = web::Data::new(AppState {
        analyzer: Analyzer::with_options(Arc::new(source), options),
        store: build_store()?,
    });

    let origins = std::env::var("REPOINSIGHT_UI_ORIGINS")
        .unwrap_or_else(|_| "http://127.0.0.1:4200,http://localhost:4200".to_string());
    let allowed_origins: Vec<String> = origins
        .split(',')
        .map(|value| value.trim())
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect();

    let listen_addr =
        std::env::var("REPOINSIGHT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let listen_port: u16 = std::env::var("REPOINSIGHT_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|_| invalid_config("REPOINSIGHT_PORT must be a u16 number".to_string()))?;
    info!("listening on {listen_addr}:{listen_port}");

    actix_web::rt::System::new().block_on(async move {
        HttpServer::new(move || {
            let mut cors = Cors::default()
                .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                .allowed_headers(vec![header::CONTENT_TYPE])
                .max_age(3600);
            for origin in &allowed_origins {
                cors = cors.allowed_origin(origin);
            }
            App::new()
                .wrap(actix_web::middleware::Logger::default())
                .wrap(cors)
                .app_data(state.clone())
                .service(analyze_repository)
                .service(latest_analysis)
                .service(health)
                .service(openapi_json)
        })
        .bind((listen_addr, listen_port))?
        .run()
        .await
    })
}

#[cfg(test)]
fn main() {}
