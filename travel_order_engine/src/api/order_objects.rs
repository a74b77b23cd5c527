use std::fmt::Display;

use chrono::NaiveDate;

use crate::db_types::OrderStatus;

/// Fixed page size for order listings.
pub const PAGE_SIZE: i64 = 15;

/// Search criteria for order listings. All provided filters are combined with logical AND.
#[derive(Debug, Clone, Default)]
pub struct OrderQueryFilter {
    /// Restrict results to orders owned by this user. Set by the workflow for actors without
    /// the `view-orders` permission.
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring match on the destination.
    pub destination: Option<String>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn with_destination<S: Into<String>>(mut self, destination: S) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// The date-range filter only applies when both bounds are present. A single bound is
    /// treated as if the filter were absent.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.status.is_none() && self.date_range().is_none() && self.destination.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(user_id) = self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(status) = self.status {
            write!(f, "status: {status}. ")?;
        }
        if let Some((start, end)) = self.date_range() {
            write!(f, "travel between {start} and {end}. ")?;
        }
        if let Some(destination) = &self.destination {
            write!(f, "destination: {destination}. ")?;
        }
        Ok(())
    }
}

/// 1-based page selector. Out-of-range values are clamped to the first page.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination {
    pub page: Option<i64>,
}

impl Pagination {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * PAGE_SIZE
    }
}

/// One page of results, together with the total match count across all pages.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.page_size - 1) / self.page_size
        }
    }
}
