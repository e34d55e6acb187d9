//! Presentational glue: askama templates and the view structs they render.

pub mod views;
