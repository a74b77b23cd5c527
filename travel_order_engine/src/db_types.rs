use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------    OrderStatus    ----------------------------------------------------------

/// The lifecycle state of a travel order.
///
/// An order starts life as `Requested` and is moved to `Approved` or `Canceled` by a reviewer.
/// Cancellation is a status value, never a row deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// The order has been submitted by its owner and awaits review.
    Requested,
    /// A reviewer has approved the order.
    Approved,
    /// The order has been canceled by its owner or a reviewer.
    Canceled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Requested => write!(f, "requested"),
            OrderStatus::Approved => write!(f, "approved"),
            OrderStatus::Canceled => write!(f, "canceled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct OrderStatusParseError(String);

impl FromStr for OrderStatus {
    type Err = OrderStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(Self::Requested),
            "approved" => Ok(Self::Approved),
            "canceled" => Ok(Self::Canceled),
            s => Err(OrderStatusParseError(s.to_string())),
        }
    }
}

//--------------------------------------    Permission    -----------------------------------------------------------

/// A named capability granted to a user. Permissions are assigned administratively; registration
/// grants none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    /// See every order on the system, not just your own.
    ViewOrders,
    /// Change the status of other users' orders.
    UpdateOrder,
    /// Cancel any order, including approved ones.
    DeleteOrder,
}

impl Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::ViewOrders => write!(f, "view-orders"),
            Permission::UpdateOrder => write!(f, "update-order"),
            Permission::DeleteOrder => write!(f, "delete-order"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid permission: {0}")]
pub struct PermissionParseError(String);

impl FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view-orders" => Ok(Self::ViewOrders),
            "update-order" => Ok(Self::UpdateOrder),
            "delete-order" => Ok(Self::DeleteOrder),
            s => Err(PermissionParseError(s.to_string())),
        }
    }
}

//--------------------------------------       User       -----------------------------------------------------------

/// A registered account. `password_hash` never leaves the server; `permissions` is loaded
/// alongside the row from the permissions table.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    pub fn owns(&self, order: &Order) -> bool {
        self.id == order.user_id
    }
}

//--------------------------------------      NewUser      ----------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Argon2 hash of the password. Hashing happens at the API boundary; the engine never sees
    /// a cleartext password.
    pub password_hash: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, email: S, password_hash: S) -> Self {
        Self { name: name.into(), email: email.into(), password_hash: password_hash.into() }
    }
}

//--------------------------------------       Order       ----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// The owning user. Immutable after creation.
    pub user_id: i64,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOrder      ---------------------------------------------------------

pub const MAX_DESTINATION_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
}

impl NewOrder {
    pub fn new<S: Into<String>>(destination: S, departure_date: NaiveDate, return_date: NaiveDate) -> Self {
        Self { destination: destination.into(), departure_date, return_date }
    }

    /// Checks the creation-time constraints. `today` is passed in so callers (and tests) control
    /// the clock. These constraints are not re-checked on status updates.
    pub fn validate(&self, today: NaiveDate) -> Result<(), OrderValidationError> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(OrderValidationError::EmptyDestination);
        }
        if destination.len() > MAX_DESTINATION_LEN {
            return Err(OrderValidationError::DestinationTooLong(destination.len()));
        }
        if self.departure_date < today {
            return Err(OrderValidationError::DepartureInPast(self.departure_date));
        }
        if self.return_date < self.departure_date {
            return Err(OrderValidationError::ReturnBeforeDeparture {
                departure: self.departure_date,
                returning: self.return_date,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("The destination must not be empty")]
    EmptyDestination,
    #[error("The destination must be at most {MAX_DESTINATION_LEN} characters, got {0}")]
    DestinationTooLong(usize),
    #[error("The departure date ({0}) must not be in the past")]
    DepartureInPast(NaiveDate),
    #[error("The return date ({returning}) must not be before the departure date ({departure})")]
    ReturnBeforeDeparture { departure: NaiveDate, returning: NaiveDate },
}
