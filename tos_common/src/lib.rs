mod dates;
mod secret;

pub use dates::{format_display_date, format_display_datetime, DISPLAY_DATE_FORMAT};
pub use secret::Secret;
