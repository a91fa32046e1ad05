// Submodules for separation of concerns
mod cursor;
mod eval;
mod exec;
mod parse;
mod types;

pub use cursor::Cursor;
pub use eval::{compare_bson, eval_filter, values_equal};
pub use exec::{count_docs, find_docs};
pub use parse::{parse_filter, parse_filter_json};
pub use types::{CmpOp, Filter};
