use crate::journal::UserStatus;
use crate::output::format::{
    create_styled_table, format_optional_date, format_optional_id, header_cell, right_cell,
    state_color, styled_cell,
};

pub(crate) fn print_status_table(journal: &str, statuses: &[UserStatus], use_color: bool) {
    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("User", use_color),
        header_cell("State", use_color),
        header_cell("Max ID", use_color),
        header_cell("Last Tweet (UTC)", use_color),
        header_cell("Last Access (UTC)", use_color),
    ]);

    for status in statuses {
        let color = if use_color { state_color(status.state) } else { None };
        table.add_row(vec![
            styled_cell(&status.user, None, true),
            styled_cell(status.state.as_str(), color, false),
            right_cell(&format_optional_id(status.max_id)),
            styled_cell(&format_optional_date(status.last_tweet_date.as_ref()), None, false),
            styled_cell(&format_optional_date(status.last_access.as_ref()), None, false),
        ]);
    }

    println!("\n  Journal {journal}\n");
    println!("{table}");
    println!("\n  {} journalled users\n", statuses.len());
}
