//! Query parameters and results shared by both backends.

mod param;
mod result;

pub use param::{Param, ParamKind, ParamType};
pub use result::{ExecOutcome, FromColumn, Row, Rows};
