/// Derived structures computed from a filtered view of the table.
///
/// ```text
///   FilteredRows
///        │
///        ├──► flow   ordered categorical columns → FlowGraph (Sankey)
///        ├──► stats  x/y measurements → ScatterSummary + Pearson correlation
///        ├──► kde    measurement per group → density curves + medians
///        └──► terms  transcripts → word frequencies
/// ```

pub mod flow;
pub mod kde;
pub mod stats;
pub mod terms;
