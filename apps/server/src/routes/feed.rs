use actix_web::{HttpResponse, Responder, get, http::header::ContentType, web};
use feedwatch::{StatsReport, Watchdog};
use tracing::error;

use crate::error::FeedError;
use crate::validation::PingRequest;

macros_utils::routes! {
    route stats_route,
    route ping_route,
}

/// Point-in-time view of every tracked client.
#[get("/stats")]
pub async fn stats_route(watchdog: web::Data<Watchdog>) -> impl Responder {
    let report = StatsReport::from(watchdog.snapshot());

    match report.to_pretty_json() {
        Ok(body) => HttpResponse::Ok().content_type(ContentType::json()).body(body),
        Err(e) => {
            error!("Failed to render stats: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Liveness ping. Registers the client on first sight and re-arms its deadline.
#[get("/{email}/{client}/{interval}")]
pub async fn ping_route(
    watchdog: web::Data<Watchdog>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, FeedError> {
    let (email, client, interval) = path.into_inner();
    let request = PingRequest::parse(email, client, &interval)?;

    watchdog.ping(request.key, request.interval_seconds);

    Ok(HttpResponse::Ok().finish())
}
