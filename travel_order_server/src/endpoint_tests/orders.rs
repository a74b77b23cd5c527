use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use travel_order_engine::{
    db_types::{Order, OrderStatus, Permission},
    events::EventProducers,
    order_objects::{Page, PAGE_SIZE},
    AuthApi,
    OrderFlowApi,
};

use super::{
    helpers::{get_request, issue_token, patch_request, post_request, test_user},
    mocks::MockBackend,
};
use crate::routes::{OrderCancelRoute, OrderUpdateStatusRoute, OrdersIndexRoute, OrdersStoreRoute};

fn order(id: i64, owner: i64, destination: &str, status: OrderStatus) -> Order {
    Order {
        id,
        user_id: owner,
        destination: destination.to_string(),
        departure_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        return_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        status,
        created_at: Utc.with_ymd_and_hms(2025, 4, 10, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2025, 4, 10, 13, 30, 0).unwrap(),
    }
}

/// Registers the order routes against mock backends. `users` answers actor and owner lookups;
/// `orders` backs the workflow.
fn register_routes(cfg: &mut ServiceConfig, orders: MockBackend, users: MockBackend) {
    let orders_api = OrderFlowApi::new(orders, EventProducers::default());
    cfg.service(OrdersIndexRoute::<MockBackend>::new())
        .service(OrdersStoreRoute::<MockBackend>::new())
        .service(OrderUpdateStatusRoute::<MockBackend>::new())
        .service(OrderCancelRoute::<MockBackend>::new())
        .app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(AuthApi::new(users)));
}

fn users_backend(permissions_for: fn(i64) -> Vec<Permission>) -> MockBackend {
    let mut users = MockBackend::new();
    users.expect_fetch_user_by_id().returning(move |id| Ok(Some(test_user(id, permissions_for(id)))));
    users
}

//----------------------------------------------   Listing  ----------------------------------------------------

fn configure_list_own(cfg: &mut ServiceConfig) {
    let mut orders = MockBackend::new();
    orders
        .expect_search_orders()
        .withf(|query, _| query.user_id == Some(1))
        .returning(|_, pagination| {
            Ok(Page {
                items: vec![
                    order(1, 1, "Paris", OrderStatus::Requested),
                    order(2, 1, "Rome", OrderStatus::Approved),
                ],
                page: pagination.page(),
                page_size: PAGE_SIZE,
                total: 2,
            })
        });
    register_routes(cfg, orders, users_backend(|_| vec![]));
}

#[actix_web::test]
async fn fetch_orders_without_a_token_fails() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/orders", configure_list_own).await.expect_err("Expected error");
    assert_eq!(err, "Authentication Error. Auth token not provided.");
}

#[actix_web::test]
async fn users_without_view_orders_are_scoped_to_their_own() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&test_user(1, vec![]));
    let (status, body) = get_request(&token, "/orders", configure_list_own).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["data"].as_array().unwrap().len(), 2);
    assert_eq!(response["data"][0]["user"]["id"], 1);
    assert_eq!(response["data"][0]["departure_date"], "01/06/2025");
    assert_eq!(response["data"][1]["status"], "approved");
    assert_eq!(response["meta"], json!({"page": 1, "page_size": 15, "total": 2, "total_pages": 1}));
}

#[actix_web::test]
async fn view_orders_holders_list_unscoped_with_filters() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders
            .expect_search_orders()
            .withf(|query, _| {
                query.user_id.is_none()
                    && query.status == Some(OrderStatus::Approved)
                    && query.destination.as_deref() == Some("rome")
            })
            .returning(|_, pagination| {
                Ok(Page {
                    items: vec![order(2, 1, "Rome", OrderStatus::Approved)],
                    page: pagination.page(),
                    page_size: PAGE_SIZE,
                    total: 1,
                })
            });
        register_routes(
            cfg,
            orders,
            users_backend(|id| if id == 42 { vec![Permission::ViewOrders] } else { vec![] }),
        );
    }
    let token = issue_token(&test_user(42, vec![Permission::ViewOrders]));
    let (status, body) =
        get_request(&token, "/orders?status=approved&destination=rome", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    // The owner of the listed order is resolved, not the acting admin.
    assert_eq!(response["data"][0]["user"]["id"], 1);
    assert_eq!(response["data"][0]["user"]["email"], "user-1@example.com");
}

#[actix_web::test]
async fn unknown_status_filters_are_rejected() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(&test_user(1, vec![]));
    let err = get_request(&token, "/orders?status=bogus", configure_list_own).await.expect_err("Expected error");
    assert_eq!(err, "Invalid order status: bogus");
}

//----------------------------------------------   Creation  ----------------------------------------------------

#[actix_web::test]
async fn creating_an_order_returns_201() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders
            .expect_insert_order()
            .withf(|owner_id, new_order| *owner_id == 1 && new_order.destination == "Paris")
            .returning(|owner_id, _| Ok(order(7, owner_id, "Paris", OrderStatus::Requested)));
        register_routes(cfg, orders, users_backend(|_| vec![]));
    }
    let token = issue_token(&test_user(1, vec![]));
    let body = json!({"destination": "Paris", "departure_date": "2030-06-01", "return_date": "2030-06-08"});
    let (status, body) = post_request(&token, "/orders", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["id"], 7);
    assert_eq!(response["status"], "requested");
    assert_eq!(response["user"]["id"], 1);
}

#[actix_web::test]
async fn invalid_travel_dates_are_rejected() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        // Validation fails before the store is touched, so no expectations.
        register_routes(cfg, MockBackend::new(), users_backend(|_| vec![]));
    }
    let token = issue_token(&test_user(1, vec![]));
    let body = json!({"destination": "Paris", "departure_date": "2030-06-08", "return_date": "2030-06-01"});
    let err = post_request(&token, "/orders", &body, configure).await.expect_err("Expected error");
    assert!(err.contains("must not be before the departure date"), "{err}");
}

//----------------------------------------------   Status updates  ----------------------------------------------

#[actix_web::test]
async fn owners_cannot_review_their_own_orders() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders.expect_fetch_order_by_id().returning(|id| Ok(Some(order(id, 1, "Paris", OrderStatus::Requested))));
        register_routes(cfg, orders, users_backend(|_| vec![Permission::UpdateOrder]));
    }
    let token = issue_token(&test_user(1, vec![Permission::UpdateOrder]));
    let body = json!({"status": "approved"});
    let err = patch_request(&token, "/orders/1", &body, configure).await.expect_err("Expected error");
    assert!(err.starts_with("Insufficient Permissions."), "{err}");
}

#[actix_web::test]
async fn reviewers_can_approve_other_peoples_orders() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders.expect_fetch_order_by_id().returning(|id| Ok(Some(order(id, 1, "Paris", OrderStatus::Requested))));
        orders
            .expect_update_order_status()
            .withf(|id, status| *id == 1 && *status == OrderStatus::Approved)
            .returning(|id, status| {
                let mut o = order(id, 1, "Paris", OrderStatus::Requested);
                o.status = status;
                Ok(o)
            });
        register_routes(
            cfg,
            orders,
            users_backend(|id| if id == 2 { vec![Permission::UpdateOrder] } else { vec![] }),
        );
    }
    let token = issue_token(&test_user(2, vec![Permission::UpdateOrder]));
    let body = json!({"status": "approved"});
    let (status, body) = patch_request(&token, "/orders/1", &body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["status"], "approved");
    assert_eq!(response["user"]["id"], 1);
}

#[actix_web::test]
async fn unknown_status_values_are_a_validation_failure() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        // The status is parsed before anything is fetched.
        register_routes(cfg, MockBackend::new(), users_backend(|_| vec![]));
    }
    let token = issue_token(&test_user(2, vec![Permission::UpdateOrder]));
    let body = json!({"status": "new"});
    let err = patch_request(&token, "/orders/1", &body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Invalid order status: new");
}

//----------------------------------------------   Cancellation  ------------------------------------------------

#[actix_web::test]
async fn owners_can_cancel_their_requested_orders() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders.expect_fetch_order_by_id().returning(|id| Ok(Some(order(id, 1, "Paris", OrderStatus::Requested))));
        orders
            .expect_update_order_status()
            .withf(|id, status| *id == 3 && *status == OrderStatus::Canceled)
            .returning(|id, status| {
                let mut o = order(id, 1, "Paris", OrderStatus::Requested);
                o.status = status;
                Ok(o)
            });
        register_routes(cfg, orders, users_backend(|_| vec![]));
    }
    let token = issue_token(&test_user(1, vec![]));
    let (status, body) =
        post_request(&token, "/orders/3/cancel", &json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["message"], "Order canceled successfully");
    assert_eq!(response["data"]["status"], "canceled");
}

#[actix_web::test]
async fn canceling_a_canceled_order_is_a_handled_failure() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders.expect_fetch_order_by_id().returning(|id| Ok(Some(order(id, 1, "Paris", OrderStatus::Canceled))));
        register_routes(cfg, orders, users_backend(|_| vec![]));
    }
    let token = issue_token(&test_user(1, vec![]));
    let err = post_request(&token, "/orders/3/cancel", &json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "This order cannot be canceled");
}

#[actix_web::test]
async fn owners_cannot_cancel_an_approved_order() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders.expect_fetch_order_by_id().returning(|id| Ok(Some(order(id, 1, "Paris", OrderStatus::Approved))));
        register_routes(cfg, orders, users_backend(|_| vec![]));
    }
    let token = issue_token(&test_user(1, vec![]));
    let err = post_request(&token, "/orders/3/cancel", &json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "This order cannot be canceled");
}

#[actix_web::test]
async fn missing_orders_are_a_404() {
    let _ = env_logger::try_init().ok();
    fn configure(cfg: &mut ServiceConfig) {
        let mut orders = MockBackend::new();
        orders.expect_fetch_order_by_id().returning(|_| Ok(None));
        register_routes(cfg, orders, users_backend(|_| vec![]));
    }
    let token = issue_token(&test_user(1, vec![]));
    let err = post_request(&token, "/orders/99/cancel", &json!({}), configure).await.expect_err("Expected error");
    assert_eq!(err, "The data was not found. The requested order (99) does not exist");
}
