//! Plain-text rendering of a transcript view for terminals.
//!
//! Markdown is parsed with pulldown-cmark and flattened to text; tables go
//! through comfy-table. User bubbles are right-aligned.

use comfy_table::{ContentArrangement, Table};
use parley_core::attachment::DataUri;
use parley_core::config::{ButtonConfig, TypingIndicator};
use parley_types::Role;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde_json::Value;
use unicode_width::UnicodeWidthStr;

use crate::chrome::{ButtonPart, button_parts, icon_glyph};
use crate::node::{FileCard, GraphNode, ImageNode, NodeKind, RenderNode, TableNode};
use crate::transcript::{EMPTY_TRANSCRIPT_TEXT, TranscriptView};

pub const DEFAULT_WIDTH: usize = 80;

/// Renders the whole view.
pub fn render_view(view: &TranscriptView, width: usize) -> String {
    let mut out = Vec::new();

    if view.is_empty {
        out.push(EMPTY_TRANSCRIPT_TEXT.to_string());
    }

    for bubble in &view.bubbles {
        let label = match bubble.role {
            Role::User => "you",
            Role::Assistant => "assistant",
            Role::Unknown => "unknown",
        };
        let mut lines = vec![format!("[{label}]")];
        for node in &bubble.nodes {
            lines.extend(render_node(node, width));
        }

        if bubble.role == Role::User {
            lines = align_right(lines, width);
        }
        out.extend(lines);
        out.push(String::new());
    }

    if let Some(indicator) = view.typing {
        out.push(match indicator {
            TypingIndicator::Dots => "• • •".to_string(),
            TypingIndicator::Spinner => "⠋ waiting for reply".to_string(),
        });
    }

    while out.last().is_some_and(String::is_empty) {
        out.pop();
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

/// One-line input bar: the placeholder followed by each visible button.
pub fn render_input_bar(placeholder: &str, buttons: &[&ButtonConfig]) -> String {
    let mut out = format!("> {placeholder}");
    for button in buttons.iter().filter(|b| b.show) {
        let parts: Vec<&str> = button_parts(button)
            .into_iter()
            .map(|part| match part {
                ButtonPart::IconLeft(icon)
                | ButtonPart::IconRight(icon)
                | ButtonPart::IconOnly(icon) => icon_glyph(icon),
                ButtonPart::Label(label) => label,
            })
            .collect();
        out.push_str(" [");
        out.push_str(&parts.join(" "));
        out.push(']');
    }
    out
}

fn align_right(lines: Vec<String>, width: usize) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            let pad = width.saturating_sub(line.width());
            format!("{}{line}", " ".repeat(pad))
        })
        .collect()
}

/// Renders one display node as lines.
pub fn render_node(node: &RenderNode, width: usize) -> Vec<String> {
    match &node.kind {
        NodeKind::Text { markdown } => render_markdown(markdown, width),
        NodeKind::Image(image) => render_image(image),
        NodeKind::Link { href, label } => vec![format!("{label} <{}>", display_source(href))],
        NodeKind::Error { message } => vec![message.clone()],
        NodeKind::FileCard(card) => render_file_card(card),
        NodeKind::Table(table) => render_table(table, width),
        NodeKind::Graph(graph) => vec![graph_summary(graph)],
    }
}

/// Data URIs are too long to print; show their type instead.
fn display_source(source: &str) -> String {
    if DataUri::is_data_uri(source) {
        let mime_type = DataUri::parse(source).map_or_else(|| "?".to_string(), |d| d.mime_type);
        return format!("inline {mime_type}");
    }
    source.to_string()
}

fn render_image(image: &ImageNode) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(description) = image.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    lines.push(format!("[image: {}] <{}>", image.alt, display_source(&image.src)));
    lines
}

fn render_file_card(card: &FileCard) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(description) = card.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push(description.to_string());
    }
    lines.push(format!(
        "[{}] {} <{}>",
        card.label,
        card.file_name,
        display_source(&card.href)
    ));
    lines
}

fn render_table(node: &TableNode, width: usize) -> Vec<String> {
    let mut table = Table::new();
    table.set_width(u16::try_from(width).unwrap_or(u16::MAX));
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if !node.header.is_empty() {
        table.set_header(&node.header);
    }
    for row in &node.rows {
        table.add_row(row);
    }

    table.to_string().lines().map(String::from).collect()
}

fn graph_summary(graph: &GraphNode) -> String {
    let title = match graph.layout.get("title") {
        Some(Value::String(title)) => Some(title.clone()),
        Some(Value::Object(title)) => title.get("text").and_then(Value::as_str).map(String::from),
        _ => None,
    };
    let traces = graph.data.len();
    let noun = if traces == 1 { "trace" } else { "traces" };
    match title {
        Some(title) => format!("[chart: {title}, {traces} {noun}]"),
        None => format!("[chart: {traces} {noun}]"),
    }
}

/// Flattens markdown into plain lines.
pub fn render_markdown(text: &str, width: usize) -> Vec<String> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut renderer = MarkdownFlattener::new(width);
    for event in Parser::new_ext(text, options) {
        renderer.process_event(event);
    }
    renderer.finish()
}

#[derive(Debug, Default)]
struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
    in_head: bool,
}

struct MarkdownFlattener {
    width: usize,
    lines: Vec<String>,
    current: String,
    list_stack: Vec<Option<u64>>,
    in_code_block: bool,
    quote_depth: usize,
    link_targets: Vec<String>,
    table: Option<TableBuffer>,
}

impl MarkdownFlattener {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: String::new(),
            list_stack: Vec::new(),
            in_code_block: false,
            quote_depth: 0,
            link_targets: Vec::new(),
            table: None,
        }
    }

    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_text(&format!("`{code}`")),
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.flush_line();
                self.lines.push("─".repeat(self.width.min(40)));
            }
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " });
            }
            // HTML is never passed through to the terminal.
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { .. } => self.flush_line(),
            Tag::CodeBlock(kind) => {
                self.flush_line();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    self.lines.push(format!("    ({lang})"));
                }
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let depth = self.list_stack.len().saturating_sub(1);
                let marker = match self.list_stack.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.current = format!("{}{marker}", "  ".repeat(depth));
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
            }
            Tag::Link { dest_url, .. } => self.link_targets.push(dest_url.to_string()),
            Tag::Table(_) => {
                self.flush_line();
                self.table = Some(TableBuffer::default());
            }
            Tag::TableHead => {
                if let Some(table) = &mut self.table {
                    table.in_head = true;
                }
            }
            Tag::TableCell => {
                if let Some(table) = &mut self.table {
                    table.current_cell.clear();
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => {
                self.flush_line();
                self.in_code_block = false;
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::Link => {
                if let Some(target) = self.link_targets.pop() {
                    self.push_text(&format!(" ({target})"));
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = &mut self.table {
                    let cell = std::mem::take(&mut table.current_cell);
                    table.current_row.push(cell.trim().to_string());
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = &mut self.table {
                    table.header = std::mem::take(&mut table.current_row);
                    table.in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = &mut self.table
                    && !table.in_head
                {
                    let row = std::mem::take(&mut table.current_row);
                    table.rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(buffer) = self.table.take() {
                    let node = TableNode {
                        classes: Vec::new(),
                        responsive: false,
                        header: buffer.header,
                        rows: buffer.rows,
                        style: parley_types::JsonMap::new(),
                    };
                    self.lines.extend(render_table(&node, self.width));
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(table) = &mut self.table {
            table.current_cell.push_str(&text.replace('\n', " "));
            return;
        }

        if self.in_code_block {
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    self.flush_line();
                }
                if !line.is_empty() {
                    self.current.push_str("    ");
                    self.current.push_str(line);
                }
            }
            return;
        }

        self.current.push_str(text);
    }

    fn flush_line(&mut self) {
        if self.current.trim().is_empty() {
            self.current.clear();
            return;
        }
        let line = std::mem::take(&mut self.current);
        let prefix = "> ".repeat(self.quote_depth);
        self.lines.push(format!("{prefix}{}", line.trim_end()));
    }

    fn finish(mut self) -> Vec<String> {
        self.flush_line();
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use parley_core::config::Config;
    use parley_types::{Content, Message};

    use super::*;
    use crate::chrome::Chrome;
    use crate::transcript::render_transcript;

    #[test]
    fn test_input_bar_lists_visible_buttons() {
        let config = Config::default();
        let mut attach = config.file_attachment_button_config.clone();
        attach.show = false;
        let mut send = config.send_button_config.clone();
        send.icon_position = parley_core::config::IconPosition::Right;

        let bar = render_input_bar("Type here", &[&attach, &send]);
        assert_eq!(bar, format!("> Type here [{} {}]", send.label, "➤"));
    }

    #[test]
    fn test_markdown_is_flattened() {
        let lines = render_markdown("# Title\n\nSome **bold** and `code`.\n\n- one\n- two\n", 80);
        assert_eq!(
            lines,
            vec!["Title", "Some bold and `code`.", "- one", "- two"]
        );
    }

    #[test]
    fn test_markdown_ordered_list_and_link() {
        let lines = render_markdown("1. [docs](https://example.com)\n2. b\n", 80);
        assert_eq!(lines, vec!["1. docs (https://example.com)", "2. b"]);
    }

    #[test]
    fn test_markdown_code_block_is_indented() {
        let lines = render_markdown("```rust\nfn main() {}\n```\n", 80);
        assert_eq!(lines, vec!["    (rust)", "    fn main() {}"]);
    }

    #[test]
    fn test_markdown_table_uses_grid() {
        let lines = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n", 40);
        let joined = lines.join("\n");
        assert!(joined.contains('a'));
        assert!(joined.contains('2'));
        assert!(lines.len() >= 3);
    }

    #[test]
    fn test_render_view() {
        let chrome = Chrome::from_config(&Config::default());
        let messages = vec![
            Message::user(1, Content::from("hi")),
            Message::assistant("hello"),
        ];
        let view = render_transcript(&messages, true, TypingIndicator::Dots, &chrome);

        let text = render_view(&view, 20);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], format!("{}[you]", " ".repeat(15)));
        assert_eq!(lines[1], format!("{}hi", " ".repeat(18)));
        assert!(text.contains("[assistant]\nhello\n"));
        assert!(text.ends_with("• • •\n"));
    }

    #[test]
    fn test_render_empty_view() {
        let chrome = Chrome::from_config(&Config::default());
        let view = render_transcript(&[], false, TypingIndicator::Dots, &chrome);
        assert_eq!(render_view(&view, 80), "No conversation yet.\n");
    }

    #[test]
    fn test_data_uri_sources_are_summarized() {
        assert_eq!(display_source("data:image/png;base64,AAAA"), "inline image/png");
        assert_eq!(display_source("https://x/y.png"), "https://x/y.png");
    }
}
