//! Content dispatcher.
//!
//! Maps a message's content to display nodes:
//!
//! 1. plain text renders as one text node;
//! 2. a list renders element by element, dispatching on each item's type;
//! 3. a single object renders as a one-element list.
//!
//! Unrecognized elements render as nothing. Keys are the element's index
//! in the list, so they stay stable across re-renders.

use parley_types::{Content, ContentItem, ContentPart};

use crate::asset::{render_asset, render_attachment};
use crate::graph::render_graph;
use crate::node::{NodeKind, RenderNode};
use crate::table::render_table;

pub fn render(content: &Content) -> Vec<RenderNode> {
    match content {
        Content::Text(text) => vec![text_node(0, text)],
        Content::Parts(parts) => render_parts(parts),
        Content::Part(part) => render_parts(std::slice::from_ref(part)),
    }
}

fn render_parts(parts: &[ContentPart]) -> Vec<RenderNode> {
    parts
        .iter()
        .enumerate()
        .filter_map(|(index, part)| render_part(index, part))
        .collect()
}

fn render_part(index: usize, part: &ContentPart) -> Option<RenderNode> {
    let item = match part {
        ContentPart::Text(text) => return Some(text_node(index, text)),
        ContentPart::Item(item) => item,
        ContentPart::Unrecognized(_) => return None,
    };

    let kind = match item {
        ContentItem::Text { text } => return Some(text_node(index, text)),
        ContentItem::Attachment(attachment) => render_attachment(attachment),
        ContentItem::Asset(asset) => render_asset(asset),
        ContentItem::Graph(graph) => NodeKind::Graph(render_graph(graph)),
        ContentItem::Table(table) => NodeKind::Table(render_table(table)),
    };
    Some(RenderNode::new(index.to_string(), kind))
}

fn text_node(index: usize, text: &str) -> RenderNode {
    RenderNode::new(
        index.to_string(),
        NodeKind::Text {
            markdown: text.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn content(value: serde_json::Value) -> Content {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_plain_text_is_one_text_node() {
        let nodes = render(&Content::from("**bold**"));
        assert_eq!(
            nodes,
            vec![RenderNode::new(
                "0",
                NodeKind::Text {
                    markdown: "**bold**".into()
                }
            )]
        );
    }

    #[test]
    fn test_one_by_one_table() {
        let nodes = render(&content(json!([
            { "type": "table", "header": ["h"], "data": [["v"]] }
        ])));

        assert_eq!(nodes.len(), 1);
        let NodeKind::Table(table) = &nodes[0].kind else {
            panic!("expected table");
        };
        assert_eq!(table.header, vec!["h"]);
        assert_eq!(table.rows, vec![vec!["v"]]);
    }

    #[test]
    fn test_unknown_items_render_nothing() {
        assert!(render(&content(json!([{ "type": "bogus" }]))).is_empty());
        assert!(render(&content(json!([null, 7, { "no": "type" }]))).is_empty());
        assert!(render(&content(json!({ "type": "video", "src": "x" }))).is_empty());
    }

    #[test]
    fn test_keys_follow_position_and_skip_unknowns() {
        let nodes = render(&content(json!([
            "intro",
            { "type": "bogus" },
            { "type": "text", "text": "body" },
            { "type": "attachment", "file": "https://x/a.txt", "fileName": "a.txt" }
        ])));

        let keys: Vec<_> = nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "2", "3"]);
        assert!(matches!(nodes[2].kind, NodeKind::Link { .. }));
    }

    #[test]
    fn test_single_object_wraps() {
        let nodes = render(&content(json!({
            "type": "graph", "props": { "figure": { "data": [] } }
        })));
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].key, "0");
        assert!(matches!(nodes[0].kind, NodeKind::Graph(_)));
    }
}
