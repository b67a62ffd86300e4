//! Rendering primitives for CLI output.

use comfy_table::{Attribute, Cell, ContentArrangement, Table as ComfyTable};

use super::context::UiContext;
use super::theme::{styled, styles, Badge};

/// Render a header line for a command.
///
/// Pretty mode: "Sealnote · command" with the collection root underneath.
/// Plain mode: "sealnote command"
pub fn header(ctx: &UiContext, command: &str, root: Option<&str>) -> String {
    if ctx.mode.is_json() {
        return String::new();
    }
    if !ctx.mode.is_pretty() {
        return format!("sealnote {}", command);
    }
    let title = styled("Sealnote", styles::bold(), ctx.color);
    let mut out = format!("{} \u{00B7} {}", title, command);
    if let Some(root) = root {
        out.push_str(&format!("\n{}", kv(ctx, "Root", root)));
    }
    out
}

/// Render a badge with optional message.
pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let colored_badge = styled(kind.display(ctx.unicode), kind.style(), ctx.color);
    if message.is_empty() {
        colored_badge
    } else {
        format!("{} {}", colored_badge, message)
    }
}

/// Render a key-value pair.
///
/// Pretty mode: "Key: value" with dim key
/// Plain mode: "key=value"
pub fn kv(ctx: &UiContext, key: &str, value: &str) -> String {
    if ctx.mode.is_pretty() {
        let styled_key = styled(&format!("{}:", key), styles::dim(), ctx.color);
        format!("{} {}", styled_key, value)
    } else {
        format!("{}={}", key.to_lowercase().replace(' ', "_"), value)
    }
}

/// Render a hint line.
pub fn hint(ctx: &UiContext, text: &str) -> String {
    if ctx.mode.is_pretty() {
        let label = styled("Hint:", styles::dim(), ctx.color);
        format!("{} {}", label, text)
    } else {
        format!("hint={}", text)
    }
}

/// Column definition for table rendering.
#[derive(Debug, Clone)]
pub struct Column {
    pub header: &'static str,
}

impl Column {
    pub const fn new(header: &'static str) -> Self {
        Self { header }
    }
}

/// Render a borderless table.
///
/// Pretty mode: aligned columns under dim headers
/// Plain mode: tab-separated values, no header
pub fn simple_table(ctx: &UiContext, columns: &[Column], rows: &[Vec<String>]) -> String {
    if !ctx.mode.is_pretty() {
        return rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut table = ComfyTable::new();
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(ctx.width.min(u16::MAX as usize) as u16);

    let header_cells: Vec<Cell> = columns
        .iter()
        .map(|c| {
            let cell = Cell::new(c.header);
            if ctx.color {
                cell.add_attribute(Attribute::Dim)
            } else {
                cell
            }
        })
        .collect();
    table.set_header(header_cells);

    for i in 0..columns.len() {
        if let Some(column) = table.column_mut(i) {
            column.set_padding((0, 2));
        }
    }

    for row in rows {
        table.add_row(row);
    }

    table.to_string()
}

/// Print to stdout unless in JSON mode.
pub fn print(ctx: &UiContext, message: &str) {
    if !ctx.mode.is_json() && !message.is_empty() {
        println!("{}", message);
    }
}

/// Format an error message with optional hint.
pub fn error_message(ctx: &UiContext, message: &str, error_hint: Option<&str>) -> String {
    let mut lines = Vec::new();

    if ctx.mode.is_pretty() {
        lines.push(badge(ctx, Badge::Err, message));
        if let Some(h) = error_hint {
            lines.push(hint(ctx, h));
        }
    } else {
        lines.push(format!("error={}", message));
        if let Some(h) = error_hint {
            lines.push(format!("hint={}", h));
        }
    }

    lines.join("\n")
}

/// Print an error message to stderr with optional hint.
pub fn print_error(ctx: &UiContext, message: &str, error_hint: Option<&str>) {
    eprintln!("{}", error_message(ctx, message, error_hint));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::OutputMode;

    fn plain_ctx() -> UiContext {
        UiContext {
            color: false,
            unicode: false,
            width: 80,
            mode: OutputMode::Plain,
            animate: false,
        }
    }

    fn pretty_ctx() -> UiContext {
        UiContext {
            color: false,
            unicode: true,
            width: 80,
            mode: OutputMode::Pretty,
            animate: false,
        }
    }

    #[test]
    fn test_header_modes() {
        assert_eq!(header(&plain_ctx(), "list", Some("/notes")), "sealnote list");

        let pretty = header(&pretty_ctx(), "list", Some("/notes"));
        assert!(pretty.contains("Sealnote"));
        assert!(pretty.contains("Root: /notes"));
    }

    #[test]
    fn test_badge_plain() {
        let b = badge(&plain_ctx(), Badge::Ok, "Saved todo");
        assert_eq!(b, "[OK] Saved todo");
    }

    #[test]
    fn test_kv_plain_and_pretty() {
        assert_eq!(kv(&plain_ctx(), "Staging Dir", "/run"), "staging_dir=/run");
        assert_eq!(kv(&pretty_ctx(), "Root", "/notes"), "Root: /notes");
    }

    #[test]
    fn test_simple_table_plain_is_tab_separated() {
        let columns = [Column::new("NAME"), Column::new("SIZE")];
        let rows = vec![
            vec!["todo".to_string(), "90 B".to_string()],
            vec!["work/plan".to_string(), "1.2 KB".to_string()],
        ];
        assert_eq!(
            simple_table(&plain_ctx(), &columns, &rows),
            "todo\t90 B\nwork/plan\t1.2 KB"
        );
    }

    #[test]
    fn test_simple_table_pretty_has_headers() {
        let columns = [Column::new("NAME"), Column::new("STATE")];
        let rows = vec![vec!["todo".to_string(), "sealed".to_string()]];
        let t = simple_table(&pretty_ctx(), &columns, &rows);
        assert!(t.contains("NAME"));
        assert!(t.contains("sealed"));
    }

    #[test]
    fn test_error_message_plain() {
        let msg = error_message(&plain_ctx(), "Note not found", Some("sealnote list"));
        assert_eq!(msg, "error=Note not found\nhint=sealnote list");
    }
}
