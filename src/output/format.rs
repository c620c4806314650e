use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, TableComponent,
    modifiers::UTF8_SOLID_INNER_BORDERS, presets::UTF8_FULL,
};
use chrono::NaiveDateTime;

use crate::consts::NONE_FIELD;
use crate::journal::UserState;
use crate::utils::format_timestamp;

pub(super) fn format_optional_id(id: Option<i64>) -> String {
    id.map_or_else(|| NONE_FIELD.to_string(), |id| id.to_string())
}

/// Dates are shown to the second; the journal keeps sub-second precision
pub(super) fn format_optional_date(date: Option<&NaiveDateTime>) -> String {
    date.map_or_else(
        || NONE_FIELD.to_string(),
        |d| d.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

pub(super) fn json_date(date: Option<&NaiveDateTime>) -> serde_json::Value {
    match date {
        Some(d) => serde_json::Value::String(format_timestamp(d)),
        None => serde_json::Value::Null,
    }
}

pub(super) fn state_color(state: UserState) -> Option<Color> {
    match state {
        UserState::Finished => Some(Color::Green),
        UserState::InUse => Some(Color::Yellow),
        UserState::Abandoned | UserState::Broken => Some(Color::Red),
        UserState::New => None,
    }
}

pub(super) fn styled_cell(text: &str, color: Option<Color>, bold: bool) -> Cell {
    let mut cell = Cell::new(text);
    if let Some(c) = color {
        cell = cell.fg(c);
    }
    if bold {
        cell = cell.add_attribute(Attribute::Bold);
    }
    cell
}

pub(super) fn header_cell(text: &str, use_color: bool) -> Cell {
    let mut cell = Cell::new(text).add_attribute(Attribute::Bold);
    if use_color {
        cell = cell.fg(Color::Cyan);
    }
    cell
}

/// Replace the double-line header separator (╞═╪═╡) with single-line (├─┼─┤)
fn normalize_header_separator(table: &mut Table) {
    table.set_style(TableComponent::HeaderLines, '─');
    table.set_style(TableComponent::LeftHeaderIntersection, '├');
    table.set_style(TableComponent::MiddleHeaderIntersections, '┼');
    table.set_style(TableComponent::RightHeaderIntersection, '┤');
}

/// Create a table with the standard preset, inner borders, and normalized header separator.
pub(super) fn create_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    normalize_header_separator(&mut table);
    table
}

pub(super) fn right_cell(text: &str) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_timestamp;

    #[test]
    fn optional_values_render_as_none() {
        assert_eq!(format_optional_id(None), "None");
        assert_eq!(format_optional_id(Some(42)), "42");
        assert_eq!(format_optional_date(None), "None");
        assert_eq!(json_date(None), serde_json::Value::Null);
    }

    #[test]
    fn ids_are_right_aligned() {
        let mut table = create_styled_table();
        table.set_header(vec![header_cell("Max ID", false)]);
        table.add_row(vec![right_cell("7")]);
        let rendered = table.to_string();
        assert!(rendered.contains("│      7 │"), "{rendered}");
    }

    #[test]
    fn dates_drop_fractional_seconds_for_display() {
        let d = parse_timestamp("2016-07-01T10:11:12.5").unwrap();
        assert_eq!(format_optional_date(Some(&d)), "2016-07-01 10:11:12");
        assert_eq!(json_date(Some(&d)), serde_json::json!("2016-07-01T10:11:12.500"));
    }
}
