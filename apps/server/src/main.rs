#![warn(clippy::all, clippy::pedantic)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use clap::Parser;
use feedwatch::{AlertSink, LogSink, SendmailSink, SystemClock, TokioScheduler, Watchdog};
use tracing::{debug, info};

mod cli;
mod config;
mod error;
mod routes;
mod validation;

use cli::Cli;
use config::{Alerts, SinkKind};
use error::AppError;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logger::init_with_debug(cli.debug);

    let config = cli.resolve_config()?;
    debug!("{config}");

    let watchdog = Watchdog::new(
        Arc::new(TokioScheduler::current()?),
        alert_sink(&config.alerts),
        Arc::new(SystemClock),
    )?;

    let ip: IpAddr = config.server.bind.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("serving at port {}", config.server.port);

    let result = run_server(addr, watchdog.clone()).await;

    watchdog.shutdown();
    info!("goodbye");
    result
}

fn alert_sink(alerts: &Alerts) -> Arc<dyn AlertSink> {
    match alerts.sink {
        SinkKind::Sendmail => Arc::new(SendmailSink::new(&alerts.sendmail, alerts.timeout())),
        SinkKind::Log => Arc::new(LogSink),
    }
}

async fn run_server(addr: SocketAddr, watchdog: Watchdog) -> Result<(), AppError> {
    let watchdog = web::Data::new(watchdog);

    HttpServer::new(move || App::new().app_data(watchdog.clone()).configure(routes::routes))
        .bind(addr)?
        .run()
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use actix_web::{
        http::{StatusCode, header},
        test,
    };
    use feedwatch::{AlertKind, ClientKey, MemorySink, StatsReport};

    use super::*;

    fn watchdog() -> (Watchdog, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let watchdog = Watchdog::new(
            Arc::new(TokioScheduler::current().unwrap()),
            sink.clone(),
            Arc::new(SystemClock),
        )
        .unwrap();
        (watchdog, sink)
    }

    macro_rules! app {
        ($watchdog:expr) => {
            test::init_service(
                App::new().app_data(web::Data::new($watchdog.clone())).configure(routes::routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_health() {
        let (watchdog, _) = watchdog();
        let app = app!(watchdog);

        let response = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_ping_registers_client() {
        let (watchdog, _) = watchdog();
        let app = app!(watchdog);

        let request = test::TestRequest::get().uri("/feed/a@x.com/box1/5").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(test::read_body(response).await.is_empty());

        let client = watchdog.registry().get(&ClientKey::new("a@x.com", "box1")).unwrap();
        assert!(client.online);
        assert_eq!(client.interval_seconds, 5);
    }

    #[actix_web::test]
    async fn test_malformed_pings_are_not_found() {
        let (watchdog, _) = watchdog();
        let app = app!(watchdog);

        for uri in [
            "/feed/a@x.com/box1/-1",
            "/feed/a@x.com/box1/abc",
            "/feed/a@x.com/box1/1.5",
            "/feed/a@x.com/box1",
            "/feed/a@x.com/box1/5/extra",
            "/feeds/a@x.com/box1/5",
        ] {
            let response = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        assert!(watchdog.registry().is_empty());
    }

    #[actix_web::test]
    async fn test_rejected_ping_body() {
        let (watchdog, _) = watchdog();
        let app = app!(watchdog);

        let request = test::TestRequest::get().uri("/feed/a@x.com/box1/-5").to_request();
        let body = test::call_and_read_body(&app, request).await;
        assert_eq!(body, web::Bytes::from_static(b"Not Found"));
    }

    #[actix_web::test]
    async fn test_stats_reflects_pings() {
        let (watchdog, _) = watchdog();
        let app = app!(watchdog);

        for uri in ["/feed/b@x.com/box2/10", "/feed/a@x.com/box1/5", "/feed/a@x.com/box1/7"] {
            test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        }

        let response =
            test::call_service(&app, test::TestRequest::get().uri("/feed/stats").to_request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let report: StatsReport = test::read_body_json(response).await;
        assert_eq!(report.data.len(), 2);
        assert_eq!(report.data[0].client, "box1");
        assert_eq!(report.data[0].interval, 7);
        assert!(report.data[0].last_ping.is_some());
        assert!(report.data.iter().all(|entry| entry.online));
    }

    #[actix_web::test]
    async fn test_empty_stats() {
        let (watchdog, _) = watchdog();
        let app = app!(watchdog);

        let request = test::TestRequest::get().uri("/feed/stats").to_request();
        let report: StatsReport = test::call_and_read_body_json(&app, request).await;
        assert!(report.data.is_empty());
    }

    #[actix_web::test]
    async fn test_zero_interval_client_goes_offline_and_recovers() {
        let (watchdog, sink) = watchdog();
        let app = app!(watchdog);
        let key = ClientKey::new("a@x.com", "box1");

        let ping = || test::TestRequest::get().uri("/feed/a@x.com/box1/0").to_request();
        test::call_service(&app, ping()).await;

        // interval 0 means the deadline fires one second later
        tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
        assert!(!watchdog.registry().get(&key).unwrap().online);
        assert_eq!(sink.count(&key, AlertKind::Offline), 1);

        test::call_service(&app, ping()).await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(watchdog.registry().get(&key).unwrap().online);
        assert_eq!(sink.count(&key, AlertKind::Recovered), 1);
    }
}
