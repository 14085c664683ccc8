pub mod clusters;
pub mod explicit;
pub mod implicit;
pub mod period;

pub use clusters::{connected_components, maximal_cliques};
pub use explicit::build_explicit_graph;
pub use implicit::{build_implicit_graph, detect_bursts, BurstMap, TokenCache};
pub use period::{PeriodGraph, PeriodGraphBuilder};
