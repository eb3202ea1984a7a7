//! HTTP endpoints for document generation.

pub mod handlers;
pub mod model;

use actix_web::web;

/// Register the `/api` document routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/invoices").route(web::post().to(handlers::create_invoice)))
        .service(web::resource("/contracts").route(web::post().to(handlers::create_contract)))
        .service(web::resource("/documents/{filename}").route(web::get().to(handlers::download_document)))
        .service(web::resource("/sequences/reset").route(web::post().to(handlers::reset_sequence)))
        .service(web::resource("/stats").route(web::get().to(handlers::get_stats)));
}
