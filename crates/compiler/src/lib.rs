//! Filter-expression compiler — turns a catalog-validated filter tree into
//! an executable SQL fragment plus its positional parameter list.

pub mod compile;

pub use compile::{CompiledFilter, FilterCompiler};
