pub(crate) mod date;
pub(crate) mod debug;

pub(crate) use date::{format_timestamp, parse_date, parse_timestamp, utc_now};
pub use debug::{debug_enabled, set_debug};
