use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    api::order_objects::{OrderQueryFilter, Page, Pagination, PAGE_SIZE},
    db_types::{NewOrder, Order, OrderStatus},
    traits::OrderFlowError,
};

pub async fn insert_order(
    owner_id: i64,
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                destination,
                departure_date,
                return_date,
                status
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(owner_id)
    .bind(order.destination.trim())
    .bind(order.departure_date)
    .bind(order.return_date)
    .bind(OrderStatus::Requested)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(OrderFlowError::OrderNotFound(id))
}

/// Fetches one page of orders matching the criteria in the `OrderQueryFilter`.
///
/// Orders are returned by `id` ascending so that paging is stable. The same filter drives both
/// the count and the page query.
pub async fn search_orders(
    query: OrderQueryFilter,
    pagination: &Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<Order>, sqlx::Error> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filters(&mut count_query, &query);
    trace!("🗃️ Executing count query: {}", count_query.sql());
    let total: i64 = count_query.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filters(&mut builder, &query);
    builder.push(" ORDER BY id ASC LIMIT ");
    builder.push_bind(PAGE_SIZE);
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {} of {total}", orders.len());
    Ok(Page { items: orders, page: pagination.page(), page_size: PAGE_SIZE, total })
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &OrderQueryFilter) {
    if query.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    // An order falls in the range when either travel date does. ISO dates compare correctly as
    // text.
    if let Some((start, end)) = query.date_range() {
        where_clause.push("(departure_date BETWEEN ");
        where_clause.push_bind_unseparated(start);
        where_clause.push_unseparated(" AND ");
        where_clause.push_bind_unseparated(end);
        where_clause.push_unseparated(" OR return_date BETWEEN ");
        where_clause.push_bind_unseparated(start);
        where_clause.push_unseparated(" AND ");
        where_clause.push_bind_unseparated(end);
        where_clause.push_unseparated(")");
    }
    if let Some(destination) = &query.destination {
        where_clause.push("LOWER(destination) LIKE ");
        where_clause.push_bind_unseparated(format!("%{}%", destination.to_lowercase()));
    }
}
