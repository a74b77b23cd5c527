use std::{future::Future, pin::Pin, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use travel_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    AuthApi,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    integrations::mailer::{LogTransport, StatusChangeMailer},
    routes::{
        health,
        LoginRoute,
        LogoutRoute,
        MeRoute,
        OrderCancelRoute,
        OrderShowRoute,
        OrderUpdateStatusRoute,
        OrdersIndexRoute,
        OrdersStoreRoute,
        RefreshRoute,
        RegisterRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 128;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let producers = start_notification_handlers().await;
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Wires the status-change hook to the mailer and spawns its handler task. The returned
/// producers are what the workflow API publishes into; the status write has always committed
/// by the time the mailer sees an event.
pub async fn start_notification_handlers() -> EventProducers {
    let mailer = StatusChangeMailer::new(LogTransport);
    let mut hooks = EventHooks::default();
    hooks.on_status_changed(move |event| {
        let mailer = mailer.clone();
        Box::pin(async move { mailer.handle(event).await }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    producers
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let auth_api = AuthApi::new(db.clone());
        let issuer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("tos::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(issuer));
        let auth_scope = web::scope("/auth")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(MeRoute::<SqliteDatabase>::new())
            .service(RefreshRoute::<SqliteDatabase>::new())
            .service(LogoutRoute::new());
        let api_scope = web::scope("/api")
            .service(OrdersIndexRoute::<SqliteDatabase>::new())
            .service(OrdersStoreRoute::<SqliteDatabase>::new())
            .service(OrderShowRoute::<SqliteDatabase>::new())
            .service(OrderUpdateStatusRoute::<SqliteDatabase>::new())
            .service(OrderCancelRoute::<SqliteDatabase>::new());
        app.service(health).service(auth_scope).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
