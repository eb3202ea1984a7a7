use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info, warn};
use sanitize_filename::sanitize;

use super::model::{GeneratedDocumentResponse, ResetSequenceRequest, ResetSequenceResponse};
use crate::generators::{
    ContractGenerator, ContractRequest, DocumentRequest, GeneratedDocument, Generator, GeneratorError,
    InvoiceGenerator, InvoiceRequest,
};
use crate::engine::error_chain;
use crate::store::UsageStats;
use crate::{AppState, ErrorResponse};

const GENERATION_FAILED: &str = "Failed to generate the document";

/// Run `generator` off the event loop, then record the requesting user.
async fn run_generation<G>(data: &web::Data<AppState>, generator: G, request: G::Request) -> HttpResponse
where
    G: Generator + Send + 'static,
    G::Request: Send + 'static,
{
    let state = data.get_ref().clone();
    let today = state.today();
    let user_id = request.user_id().to_string();
    let result = web::block(move || -> Result<GeneratedDocument, GeneratorError> {
        let generated = generator.generate(request)?;
        if let Err(e) = state.metrics.track_unique_user(&user_id, today) {
            warn!("Failed to record user {}: {}", user_id, error_chain(&e));
        }
        Ok(generated)
    })
    .await
    .map_err(|e| GeneratorError::Join(e.to_string()))
    .and_then(|r| r);

    match result {
        Ok(doc) => {
            info!("Document {} generated", doc.filename);
            HttpResponse::Ok().json(GeneratedDocumentResponse::from(doc))
        }
        Err(GeneratorError::Validation(message)) => {
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message))
        }
        Err(GeneratorError::RenderFailed) => {
            error!("Document rendering failed");
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
                "Failed to create the document. Check the template and its tags.",
            ))
        }
        Err(e) => {
            error!("Document generation failed: {}", error_chain(&e));
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(GENERATION_FAILED))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    post,
    path = "/invoices",
    request_body = InvoiceRequest,
    responses(
        (status = 200, description = "Invoice generated", body = GeneratedDocumentResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn create_invoice(req: web::Json<InvoiceRequest>, data: web::Data<AppState>) -> impl Responder {
    let request = req.into_inner();
    info!(
        "Executing create_invoice for user {} ({} items)",
        request.user_id,
        request.items.len()
    );
    let generator = InvoiceGenerator::new(data.generators.clone());
    run_generation(&data, generator, request).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    post,
    path = "/contracts",
    request_body = ContractRequest,
    responses(
        (status = 200, description = "Contract generated", body = GeneratedDocumentResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn create_contract(req: web::Json<ContractRequest>, data: web::Data<AppState>) -> impl Responder {
    let request = req.into_inner();
    info!(
        "Executing create_contract for user {} ({} items)",
        request.user_id,
        request.items.len()
    );
    let generator = ContractGenerator::new(data.generators.clone());
    run_generation(&data, generator, request).await
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    get,
    path = "/documents/{filename}",
    responses(
        (status = 200, description = "Generated DOCX file"),
        (status = 404, description = "Document not found", body = ErrorResponse)
    ),
    params(
        ("filename" = String, Path, description = "File name returned by a generation call")
    )
)]
pub async fn download_document(
    req: HttpRequest,
    filename: web::Path<String>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let requested = filename.into_inner();
    let safe = sanitize(&requested);
    if safe.is_empty() || safe != requested {
        warn!("Rejected document name '{}'", requested);
        return HttpResponse::NotFound().json(ErrorResponse::not_found("Document not found"));
    }

    let path = data.generators.output_dir.join(&safe);
    match NamedFile::open_async(&path).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            warn!("Document '{}' not served: {}", safe, e);
            HttpResponse::NotFound().json(ErrorResponse::not_found(&format!(
                "Document '{}' not found",
                safe
            )))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    post,
    path = "/sequences/reset",
    request_body = ResetSequenceRequest,
    responses(
        (status = 200, description = "Today's numbering restarted", body = ResetSequenceResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    )
)]
pub async fn reset_sequence(req: web::Json<ResetSequenceRequest>, data: web::Data<AppState>) -> impl Responder {
    let user_id = req.into_inner().user_id;
    if user_id.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request("user_id must not be empty"));
    }

    let today = data.today();
    let ctx = data.generators.clone();
    let user = user_id.clone();
    match web::block(move || ctx.sequences.reset(today, &user)).await {
        Ok(Ok(previous)) => HttpResponse::Ok().json(ResetSequenceResponse {
            user_id,
            date: today.format("%Y-%m-%d").to_string(),
            previous,
        }),
        Ok(Err(e)) => {
            error!("Failed to reset sequence for {}: {}", user_id, error_chain(&e));
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error("Failed to reset the sequence"))
        }
        Err(e) => {
            error!("Reset task failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Documents",
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Unique user statistics", body = UsageStats)
    )
)]
pub async fn get_stats(data: web::Data<AppState>) -> impl Responder {
    let today = data.today();
    let metrics = data.metrics.clone();
    match web::block(move || metrics.stats(today)).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            error!("Stats task failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}
