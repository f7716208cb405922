//! Query building blocks for aerokv
//!
//! Pure, synchronous pieces the namespace façade drives:
//! - [`KeyCodec`] addresses records in the store
//! - [`PredicateFilter`] evaluates `where` clauses in memory
//! - [`ResultSorter`] applies `orderBy` to a page
//! - argument structs describing each operation

mod args;
mod codec;
mod predicate;
mod sorter;

pub use args::{
    CountArgs, CreateArgs, DeleteArgs, DeleteManyArgs, DeleteManyResult, FieldFlags,
    FindManyArgs, FindManyResult, FindUniqueArgs, Include, Select, UpdateArgs, UpsertArgs,
};
pub use codec::KeyCodec;
pub use predicate::{values_equal, Condition, Operator, PredicateFilter, WhereClause};
pub use sorter::{OrderBy, ResultSorter, SortDirection};
