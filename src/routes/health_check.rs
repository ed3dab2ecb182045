use actix_web::HttpResponse;

/// Liveness probe. Does not touch the store.
#[tracing::instrument(name = "Health check handler")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
