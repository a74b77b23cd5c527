//! Travel Order Engine
//!
//! The travel order engine contains the core logic for the travel order request API: submitting
//! orders, moving them through the requested/approved/canceled lifecycle, and notifying owners
//! of status changes. It is HTTP-framework agnostic.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@traits`] and the SQLite backend). You should never
//!    need to access the database directly; use the public APIs instead. The exception is the
//!    data types used in the database, which are defined in [`mod@db_types`] and are public.
//! 2. The engine public API: [`OrderFlowApi`] for the order workflow and [`AuthApi`] for
//!    account and permission management. Backends implement the traits in [`mod@traits`] to
//!    power these APIs.
//! 3. The event hooks ([`mod@events`]). When an order's status lands on approved or canceled,
//!    an `OrderStatusChanged` event is emitted. A simple actor setup lets the surrounding
//!    server hook into these events, which is how owner notifications leave the system.
mod api;
pub mod authz;
pub mod db_types;
pub mod events;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

pub use api::{auth_api::AuthApi, order_flow_api::OrderFlowApi, order_objects};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{AuthApiError, OrderFlowError, OrderManagement, UserManagement, WorkflowDatabase};
