//! Page layout analysis: grouping positioned tokens into lines and rows,
//! finding per-person sections and resolving table columns.

pub mod columns;
pub mod grouper;
pub mod sections;
