//! Terminal surface: input line, embed preview, and activity log.

mod app;
mod screen;

pub use app::run;
