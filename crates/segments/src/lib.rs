//! Segment persistence and hierarchical resolution — audiences, their
//! segment forest, lifecycle transitions, and pinned-version compilation.

pub mod resolver;
pub mod store;

pub use resolver::SegmentResolver;
pub use store::SegmentStore;
