pub mod config;
pub mod diff;
pub mod dump;
pub mod history;
pub mod ir;
pub mod keys;
pub mod layout;
pub mod measure;
pub mod normalize;
pub mod render;
pub mod schema;
pub mod theme;
pub mod tree;
pub mod view;

pub use config::ViewConfig;
pub use diff::{DiffOutcome, KeyedScene, Phase, reconcile};
pub use history::{History, HistoryEntry};
pub use ir::{InstanceArena, InstanceNode, InstanceSet, NodeId};
pub use layout::{TreeLayout, compute_tree_layout};
pub use normalize::instance_result;
pub use render::render_frame;
pub use schema::OntologySchema;
pub use theme::Theme;
pub use tree::{BuildMode, TreeBuilder, UsedIds};
pub use view::{
    DeliverOutcome, IdentityQueries, QueryBuilder, QueryRequest, TreeView, ViewError,
};
