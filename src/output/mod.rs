mod format;
mod json;
mod table;

pub(crate) use json::output_status_json;
pub(crate) use table::print_status_table;
