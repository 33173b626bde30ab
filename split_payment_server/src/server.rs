use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::info;
use payout_tools::PayoutApi;
use split_payment_engine::{SettlementApi, SettlementFlowApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{notify::LogNotifier, payouts::PayoutGateway},
    middleware::HmacMiddlewareFactory,
    routes::{health, PaymentWebhookRoute},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<actix_web::dev::Server, ServerError> {
    let payout_api =
        PayoutApi::new(config.payouts.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!(
        "💻️ Settlement split configured at {}% platform / {}% vendor.",
        config.split.platform_percent, config.split.vendor_percent
    );
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let flow_api = SettlementFlowApi::new(db.clone());
        let settlement_api =
            SettlementApi::new(db.clone(), PayoutGateway::new(payout_api.clone()), config.split.clone());
        let notifier = LogNotifier;
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sps::access_log"))
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(settlement_api))
            .app_data(web::Data::new(notifier));
        // Every gateway-facing route sits behind the HMAC check.
        let webhook_scope = web::scope("/webhooks")
            .wrap(HmacMiddlewareFactory::new(
                &config.webhook.signature_header,
                config.webhook.hmac_secret.clone(),
                config.webhook.verify_signatures,
            ))
            .service(PaymentWebhookRoute::<SqliteDatabase, PayoutGateway, LogNotifier>::new());
        app.service(health).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
