//! Versioned field catalog and storage-expression mapper — the vocabulary
//! filter authors write against, and its translation to query fragments.

pub mod mapper;
pub mod registry;

pub use mapper::{to_expression, ExpressionEntry, StorageExpr};
pub use registry::{CatalogRegistry, FieldCatalog};
