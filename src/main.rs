use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use change_request_desk::config::Settings;
use change_request_desk::{build_state, page_directory, routes};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(settings: &Settings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so its level and format apply
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings);

    info!("Starting change request desk...");

    let pages = page_directory(&settings).map_err(|e| {
        error!("Failed to set up page directory: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let app_state = build_state(&settings, pages).map_err(|e| {
        error!("Failed to initialize services: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    if app_state.pipeline.ticketing.is_some() {
        info!("Jira client initialized");
    } else {
        error!("Jira client not configured; submissions will fail until it is");
    }

    info!("CAPTCHA policy: {:?}", app_state.pipeline.policy.captcha_policy);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
