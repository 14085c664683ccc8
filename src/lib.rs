pub mod aggregation;
pub mod edit;
pub mod export;
pub mod graph;
pub mod links;
pub mod logging;
pub mod pipeline;
pub mod similarity;

pub const TARGET_INGEST: &str = "ingest";
pub const TARGET_GRAPH: &str = "graph";
pub const TARGET_AGGREGATION: &str = "aggregation";
