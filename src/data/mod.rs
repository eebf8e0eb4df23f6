//! Log records, field expressions and the data model behind every graph.

pub mod expr;
pub mod field;
pub mod figure;
pub mod flightmode;
pub mod graph;
pub mod live;
pub mod record;
pub mod time;
pub mod trace_look;
pub mod x_formatter;
