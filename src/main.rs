use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use taskvault::auth::{AuthMiddleware, TokenManager};
use taskvault::config::Config;
use taskvault::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let tokens = web::Data::new(TokenManager::new(&config.auth));
    let pool = web::Data::new(pool);
    let cors_origin = config.cors_origin.clone();

    log::info!("starting TaskVault server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&cors_origin)
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api/v1")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
