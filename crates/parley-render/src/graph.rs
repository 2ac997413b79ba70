use parley_types::{Figure, Graph, JsonMap};
use serde_json::Value;

use crate::node::GraphNode;

/// Builds a plot node.
///
/// The effective config is `{responsive, ..config}`: keys the host set
/// explicitly win, and `responsive` defaults to true there. The resize
/// handler, which makes the plot fill its container, is only on when the
/// host set `responsive: true`.
pub fn render_graph(graph: &Graph) -> GraphNode {
    let props = &graph.props;
    let use_resize_handler = props.responsive.unwrap_or(false);

    let mut config = JsonMap::new();
    config.insert(
        "responsive".to_string(),
        Value::Bool(props.responsive.unwrap_or(true)),
    );
    config.extend(props.config.clone());

    let Figure {
        data,
        layout,
        frames,
    } = graph.figure().cloned().unwrap_or_default();

    let mut style = JsonMap::new();
    if use_resize_handler {
        style.insert("width".to_string(), Value::from("100%"));
        style.insert("height".to_string(), Value::from("100%"));
    }
    style.extend(props.style.clone());

    GraphNode {
        div_id: props.id.clone(),
        data,
        layout,
        frames,
        config,
        use_resize_handler,
        revision: props.revision.clone(),
        animate: props.animate,
        animation: props.animation_options.clone(),
        style,
        class_name: props.class_name.clone().unwrap_or_default(),
    }
}
