//! Structural perception: turns the live DOM into the compact page context handed to the
//! test generator.

pub mod api;
pub mod errors;
pub mod judges;
pub mod model;
pub mod policy;
pub mod sampler;
pub mod structural;

pub use api::StructuralPerceiver;
pub use errors::PerceptionError;
pub use model::RawNode;
pub use policy::SummaryPolicy;
pub use structural::DomSummarizer;
