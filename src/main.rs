use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;

use courseforge::config::AppConfig;
use courseforge::models::AppStartTime;
use courseforge::routes;
use courseforge::runtime::lifetime;
use courseforge::utils::{json_error_handler, query_error_handler};

/// 开发环境输出带源码位置的可读日志，其余环境输出 JSON
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .with_writer(writer)
        .with_level(true);

    if config.is_development() {
        builder.with_file(true).with_line_number(true).init();
    } else {
        builder.json().init();
    }
    guard
}

/// allowed_origins 为空时放开来源，否则只允许列出的前端地址；
/// refresh token 走 cookie，需要带凭据
fn build_cors(config: &AppConfig) -> Cors {
    let cors = Cors::default()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(config.cors.max_age);

    if config.cors.allowed_origins.is_empty() {
        cors.allow_any_origin()
    } else {
        config
            .cors
            .allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    setup_panic!();

    let started = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    AppConfig::init().map_err(|e| std::io::Error::other(format!("Configuration error: {e}")))?;
    let config = AppConfig::get();
    let _log_guard = init_tracing(config);

    warn!(
        "{} {} starting ({} environment, workflow deadline {} ms)",
        config.app.system_name,
        env!("CARGO_PKG_VERSION"),
        config.app.environment,
        config.workflow.operation_timeout_ms
    );

    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| std::io::Error::other(e.format_simple()))?;
    debug!(
        "Storage, admin seed and cache ready after {} ms",
        (chrono::Utc::now() - started.start_datetime).num_milliseconds()
    );

    let storage = web::Data::new(startup.storage);
    let cache = web::Data::new(startup.cache);
    let started = web::Data::new(started);
    let keep_alive = config.server.http.keep_alive_secs;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(build_cors(config))
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Keep-Alive", format!("timeout={keep_alive}, max=1000")))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            // 参数解析失败也返回统一响应体
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PayloadConfig::new(config.server.max_payload_bytes))
            .app_data(storage.clone())
            .app_data(cache.clone())
            .app_data(started.clone())
            .configure(routes::configure_api)
    })
    .keep_alive(Duration::from_secs(keep_alive))
    .client_request_timeout(Duration::from_millis(config.server.http.request_ms))
    .client_disconnect_timeout(Duration::from_millis(config.server.http.disconnect_ms))
    .workers(config.server.workers);

    #[cfg(unix)]
    let server = match config.unix_socket_path() {
        Some(path) => {
            warn!("Listening on unix socket {} with {} workers", path, config.server.workers);
            if std::path::Path::new(path).exists() {
                std::fs::remove_file(path)?;
            }
            server.bind_uds(path)?
        }
        None => {
            let address = config.server_bind_address();
            warn!("Listening on http://{} with {} workers", address, config.server.workers);
            server.bind(address)?
        }
    };

    #[cfg(not(unix))]
    let server = {
        let address = config.server_bind_address();
        warn!("Listening on http://{} with {} workers", address, config.server.workers);
        server.bind(address)?
    };

    tokio::select! {
        res = server.run() => res?,
        _ = lifetime::shutdown::listen_for_shutdown() => {
            warn!("Shutdown signal handled, server stopped");
        }
    }

    Ok(())
}
