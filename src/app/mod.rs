//! Graph windows.
//!
//! | Sub-module    | Responsibility |
//! | ------------- | -------------- |
//! | [`graph_app`] | Interactive batch graph: bands, dual axes, legends, save, linked zoom |
//! | [`live_app`]  | Live strip chart driven by a [`LiveReceiver`](crate::sink::LiveReceiver) |
//! | [`run`]       | [`run_graph()`] and [`run_live()`] entry points |

mod graph_app;
mod live_app;
mod run;

pub use graph_app::GraphApp;
pub use live_app::LiveGraphApp;
pub use run::{run_graph, run_live};
