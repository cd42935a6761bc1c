#[cfg(feature = "gui")]
mod results_window;

#[cfg(feature = "gui")]
pub use results_window::{show_results, ResultsWindow};
