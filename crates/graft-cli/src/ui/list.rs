//! Registry listing table for `graft list`

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, ContentArrangement, Table};
use graft_schema::RegistryItem;

/// Longest description shown before truncation
const DESCRIPTION_WIDTH: usize = 60;

/// Build the listing table, one row per item in the given order
pub fn item_table(items: &[&RegistryItem]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec!["name", "type", "files", "description"]);

    for item in items {
        let description = if item.description.is_empty() {
            item.title.as_str()
        } else {
            item.description.as_str()
        };
        table.add_row(vec![
            Cell::new(item.name.as_str()),
            Cell::new(item.kind.as_str()),
            Cell::new(item.files.len()),
            Cell::new(truncate(description, DESCRIPTION_WIDTH)),
        ]);
    }

    table
}

/// Truncate to `max` characters, ending with an ellipsis when cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_items_in_order() {
        let mut button = RegistryItem::new("button", vec!["button.tsx".into()]);
        button.description = "Clickable action".into();
        let mut icon = RegistryItem::new("icon-frame", vec!["icon-frame.tsx".into()]);
        icon.title = "Icon Frame".into();

        let rendered = item_table(&[&button, &icon]).to_string();
        let button_at = rendered.find("button").unwrap();
        let icon_at = rendered.find("icon-frame").unwrap();
        assert!(button_at < icon_at);
        assert!(rendered.contains("Clickable action"));
        assert!(rendered.contains("Icon Frame"));
        assert!(rendered.contains("primitive"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
    }
}
