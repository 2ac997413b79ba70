use parley_types::{Table, TableProps, TableSize, cell_text};

use crate::node::TableNode;

/// Builds the class list, in a fixed order: `table`, the host's class
/// name, flags, size, then `table-dark`.
pub fn table_classes(props: &TableProps) -> Vec<String> {
    let mut classes = vec!["table".to_string()];

    if let Some(class_name) = props.class_name.as_deref().filter(|c| !c.is_empty()) {
        classes.push(class_name.to_string());
    }

    let flags = [
        (props.striped, "table-striped"),
        (props.bordered, "table-bordered"),
        (props.borderless, "table-borderless"),
        (props.hover, "table-hover"),
    ];
    classes.extend(
        flags
            .into_iter()
            .filter(|(on, _)| *on)
            .map(|(_, class)| class.to_string()),
    );

    let size = match props.size {
        Some(TableSize::Sm) => Some("table-sm"),
        Some(TableSize::Md) => Some("table-md"),
        Some(TableSize::Lg) => Some("table-lg"),
        Some(TableSize::Other) | None => None,
    };
    classes.extend(size.map(str::to_string));

    if props.dark {
        classes.push("table-dark".to_string());
    }

    classes
}

pub fn render_table(table: &Table) -> TableNode {
    TableNode {
        classes: table_classes(&table.props),
        responsive: table.props.responsive,
        header: table.header.iter().map(cell_text).collect(),
        rows: table
            .data
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect(),
        style: table.props.style.clone().unwrap_or_default(),
    }
}
