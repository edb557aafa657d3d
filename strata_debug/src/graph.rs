// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of pipeline and layer graphs.
//!
//! [`pipeline_graph`] walks a pipeline and all of its descendants and
//! describes every node: its parent, the state groups it stores locally and
//! the layers it owns. Handles are written as `"p<index>@<generation>"` and
//! `"l<index>@<generation>"`.

use std::io::Write;

use serde_json::{Value, json};

use strata_core::{Context, LayerId, PipelineId};

fn pipeline_name(p: PipelineId) -> String {
    format!("p{}@{}", p.index(), p.generation())
}

fn layer_name(l: LayerId) -> String {
    format!("l{}@{}", l.index(), l.generation())
}

fn groups<T>(names: impl Iterator<Item = (&'static str, T)>) -> Vec<&'static str> {
    names.map(|(name, _)| name).collect()
}

fn layer_node(cx: &Context, layer: LayerId) -> Value {
    json!({
        "id": layer_name(layer),
        "parent": cx.layer_parent(layer).map(layer_name),
        "owner": cx.layer_owner(layer).map(pipeline_name),
        "index": cx.layer_index(layer),
        "differences": groups(cx.layer_differences(layer).iter_names()),
    })
}

fn pipeline_node(cx: &Context, pipeline: PipelineId) -> Value {
    let owned: Vec<Value> = cx
        .pipeline_layer_differences(pipeline)
        .iter()
        .map(|&l| layer_node(cx, l))
        .collect();
    let effective: Vec<String> = cx
        .pipeline_layers(pipeline)
        .into_iter()
        .map(layer_name)
        .collect();
    json!({
        "id": pipeline_name(pipeline),
        "parent": cx.pipeline_parent(pipeline).map(pipeline_name),
        "weak": cx.is_weak_pipeline(pipeline),
        "age": cx.pipeline_age(pipeline),
        "differences": groups(cx.pipeline_differences(pipeline).iter_names()),
        "layers": owned,
        "effective_layers": effective,
    })
}

/// Describes `root` and every pipeline below it, parents before children.
#[must_use]
pub fn pipeline_graph(cx: &Context, root: PipelineId) -> Value {
    let mut nodes = Vec::new();
    let mut stack = vec![root];
    while let Some(pipeline) = stack.pop() {
        nodes.push(pipeline_node(cx, pipeline));
        let mut children = cx.pipeline_children(pipeline);
        children.reverse();
        stack.extend(children);
    }
    json!({
        "root": pipeline_name(root),
        "pipeline_nodes": cx.pipeline_node_count(),
        "layer_nodes": cx.layer_node_count(),
        "samplers": cx.sampler_count(),
        "nodes": nodes,
    })
}

/// Writes [`pipeline_graph`] as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_pipeline_graph<W: Write>(
    writer: W,
    cx: &Context,
    root: PipelineId,
) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, &pipeline_graph(cx, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Color;

    fn node<'a>(graph: &'a Value, id: &str) -> &'a Value {
        graph["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["id"] == id)
            .unwrap_or_else(|| panic!("no node {id} in {graph}"))
    }

    fn has_group(node: &Value, group: &str) -> bool {
        node["differences"]
            .as_array()
            .unwrap()
            .iter()
            .any(|g| g == group)
    }

    #[test]
    fn exports_descendants_with_parents() {
        let mut cx = Context::new();
        let a = cx.new_pipeline();
        cx.set_color(a, Color::BLACK);
        let b = cx.copy_pipeline(a);
        cx.set_layer_combine_constant(b, 0, Color::WHITE);
        let w = cx.weak_copy_pipeline(b);

        let graph = pipeline_graph(&cx, a);
        assert_eq!(graph["root"], pipeline_name(a));
        assert_eq!(graph["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(graph["nodes"][0]["id"], pipeline_name(a));

        let a_node = node(&graph, &pipeline_name(a));
        assert!(has_group(a_node, "COLOR"));
        assert_eq!(a_node["weak"], false);

        let b_node = node(&graph, &pipeline_name(b));
        assert_eq!(b_node["parent"], pipeline_name(a));
        assert!(has_group(b_node, "LAYERS"));
        let layer = &b_node["layers"][0];
        assert_eq!(layer["index"], 0);
        assert_eq!(layer["owner"], pipeline_name(b));
        assert!(has_group(layer, "COMBINE_CONSTANT"));
        assert_eq!(b_node["effective_layers"][0], layer["id"]);

        let w_node = node(&graph, &pipeline_name(w));
        assert_eq!(w_node["weak"], true);
        assert_eq!(w_node["parent"], pipeline_name(b));
    }

    #[test]
    fn writes_parseable_json() {
        let cx = Context::new();
        let mut out = Vec::new();
        write_pipeline_graph(&mut out, &cx, cx.default_pipeline()).unwrap();
        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["nodes"][0]["parent"], Value::Null);
        assert_eq!(parsed["nodes"][0]["weak"], false);
    }
}
