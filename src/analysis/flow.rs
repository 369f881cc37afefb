use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::data::filter::FilteredRows;
use crate::data::model::{CategoricalField, title_case};

// ---------------------------------------------------------------------------
// Edge colours: literal lookup table
// ---------------------------------------------------------------------------

/// A colour as the `#RRGGBB` string handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexColor(pub &'static str);

pub const MAGENTA: HexColor = HexColor("#de8c9d");
pub const BLUE: HexColor = HexColor("#397684");
pub const PINK: HexColor = HexColor("#FF0050");
pub const AQUA: HexColor = HexColor("#00F2EA");
pub const GRAY: HexColor = HexColor("#333333");
pub const ORANGE: HexColor = HexColor("#FFA500");
pub const DARK_RED: HexColor = HexColor("#8B0000");

/// Edges flowing into one of these (field, value) targets take this colour
/// regardless of where they come from.
pub const TARGET_OVERRIDES: &[(CategoricalField, &str, HexColor)] = &[
    (CategoricalField::AuthorBanStatus, "under review", ORANGE),
    (CategoricalField::AuthorBanStatus, "banned", DARK_RED),
];

/// Otherwise an edge is coloured by its source value.
pub const SOURCE_COLORS: &[(&str, HexColor)] = &[
    ("claim", MAGENTA),
    ("opinion", BLUE),
    ("not verified", PINK),
    ("verified", AQUA),
];

/// Used when the source value has no entry in [`SOURCE_COLORS`].
pub const DEFAULT_EDGE_COLOR: HexColor = GRAY;

/// Colour of an edge from `source_value` into `target_value` of
/// `target_field`.
pub fn edge_color(target_field: CategoricalField, target_value: &str, source_value: &str) -> HexColor {
    TARGET_OVERRIDES
        .iter()
        .find(|(field, value, _)| *field == target_field && *value == target_value)
        .map(|(_, _, color)| *color)
        .or_else(|| {
            SOURCE_COLORS
                .iter()
                .find(|(value, _)| *value == source_value)
                .map(|(_, color)| *color)
        })
        .unwrap_or(DEFAULT_EDGE_COLOR)
}

// ---------------------------------------------------------------------------
// Flow graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: usize,
    pub field: CategoricalField,
    pub value: String,
    /// Title-cased value shown next to the node.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub source: usize,
    pub target: usize,
    /// Number of rows carrying both endpoint values.
    pub weight: usize,
    pub color: HexColor,
}

/// Layered, weighted graph of how rows move across a sequence of
/// categorical columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of edge weights between two adjacent columns.
    pub fn total_weight_between(&self, from: CategoricalField, to: CategoricalField) -> usize {
        self.edges
            .iter()
            .filter(|e| {
                self.nodes[e.source].field == from && self.nodes[e.target].field == to
            })
            .map(|e| e.weight)
            .sum()
    }
}

/// Build the flow graph of `rows` across `field_order`.
///
/// Node ids are handed out per column in `field_order`, and within a column
/// in the order values are first seen in the table. Edges join adjacent
/// columns only and are listed per column pair in lexical key order.
/// Fewer than two columns or no rows gives an empty graph.
pub fn build_flow_graph(rows: &FilteredRows<'_>, field_order: &[CategoricalField]) -> FlowGraph {
    if field_order.len() < 2 || rows.is_empty() {
        return FlowGraph::default();
    }

    let mut nodes = Vec::new();
    // Keyed by position in `field_order` so a repeated column still gets
    // its own nodes.
    let mut node_ids: HashMap<(usize, &str), usize> = HashMap::new();
    for (position, &field) in field_order.iter().enumerate() {
        for value in rows.iter().filter_map(|r| r.categorical(field)) {
            if node_ids.contains_key(&(position, value)) {
                continue;
            }
            let id = nodes.len();
            node_ids.insert((position, value), id);
            nodes.push(FlowNode {
                id,
                field,
                value: value.to_string(),
                label: title_case(value),
            });
        }
    }

    let mut edges = Vec::new();
    for (position, pair) in field_order.windows(2).enumerate() {
        let (from, to) = (pair[0], pair[1]);
        let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for record in rows.iter() {
            if let (Some(a), Some(b)) = (record.categorical(from), record.categorical(to)) {
                *counts.entry((a, b)).or_default() += 1;
            }
        }
        for ((a, b), weight) in counts {
            edges.push(FlowEdge {
                source: node_ids[&(position, a)],
                target: node_ids[&(position + 1, b)],
                weight,
                color: edge_color(to, b, a),
            });
        }
    }

    log::debug!(
        "flow graph over {} rows: {} nodes, {} edges",
        rows.len(),
        nodes.len(),
        edges.len()
    );
    FlowGraph { nodes, edges }
}
