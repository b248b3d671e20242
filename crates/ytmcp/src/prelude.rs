pub use crate::error::Error;

pub use anstream::{eprintln, println};
pub use color_eyre::eyre::{eyre, Result};

/// Borderless table with a bold header row, used by the `yt` text output
pub fn new_table(header: [&str; 2]) -> prettytable::Table {
    let mut table = prettytable::Table::new();
    table.set_format(
        prettytable::format::FormatBuilder::new()
            .column_separator(' ')
            .padding(1, 1)
            .build(),
    );
    table.set_titles(prettytable::Row::new(
        header
            .iter()
            .map(|title| prettytable::Cell::new(title).style_spec("b"))
            .collect(),
    ));
    table
}
