use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tos_common::{format_display_date, format_display_datetime};
use travel_order_engine::{
    db_types::{Order, Permission, User},
    order_objects::Page,
};

//--------------------------------------   Auth payloads   ----------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, ttl: Duration) -> Self {
        Self { access_token, token_type: "bearer".to_string(), expires_in: ttl.num_seconds() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub user: UserResource,
    #[serde(flatten)]
    pub token: TokenResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResource {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub permissions: Vec<Permission>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for UserResource {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            permissions: user.permissions.clone(),
            created_at: format_display_datetime(user.created_at),
            updated_at: format_display_datetime(user.updated_at),
        }
    }
}

//--------------------------------------   Order payloads   ---------------------------------------------------------

/// Dates arrive in ISO (`yyyy-mm-dd`) form and leave in `dd/mm/yyyy` display form.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreOrderRequest {
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    /// One of `requested`, `approved` or `canceled`. Anything else is a validation failure,
    /// so the status is parsed by the handler rather than deserialized into the enum here.
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexOrderRequest {
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub destination: Option<String>,
    pub page: Option<i64>,
}

/// The public representation of an order, owner embedded, calendar dates in display form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResource {
    pub id: i64,
    pub user: OrderOwner,
    pub destination: String,
    pub departure_date: String,
    pub return_date: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderOwner {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl OrderResource {
    pub fn new(order: &Order, owner: &User) -> Self {
        Self {
            id: order.id,
            user: OrderOwner { id: owner.id, name: owner.name.clone(), email: owner.email.clone() },
            destination: order.destination.clone(),
            departure_date: format_display_date(order.departure_date),
            return_date: format_display_date(order.return_date),
            status: order.status.to_string(),
            created_at: format_display_datetime(order.created_at),
            updated_at: format_display_datetime(order.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersPageResource {
    pub data: Vec<OrderResource>,
    pub meta: PageMeta,
}

impl OrdersPageResource {
    pub fn new(page: &Page<Order>, resources: Vec<OrderResource>) -> Self {
        Self {
            data: resources,
            meta: PageMeta {
                page: page.page,
                page_size: page.page_size,
                total: page.total,
                total_pages: page.total_pages(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOrderResponse {
    pub message: String,
    pub data: OrderResource,
}
