use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use clienttrack_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{EmailClient, PayPalClient, PlatformOAuthClient, StorageClient},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let email_client = EmailClient::new(config.mail.clone());
    let paypal_client = PayPalClient::new(config.paypal.clone());
    let oauth_client = PlatformOAuthClient::new(config.platforms.clone());
    let storage_client = StorageClient::new(config.storage.clone());

    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        email_client.clone(),
        config.security.clone(),
    );
    let account_service = AccountService::new(pool.clone(), paypal_client, email_client);
    let platform_service = PlatformService::new(pool.clone(), oauth_client);
    let admin_service = AdminService::new(pool.clone());
    let brand_service = BrandService::new(pool.clone(), storage_client);

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(account_service.clone()))
            .app_data(web::Data::new(platform_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .app_data(web::Data::new(brand_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::subscription_config)
                    .configure(handlers::platform_config)
                    .configure(handlers::admin_config)
                    .configure(handlers::brand_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
