//! Templating for rule fields.
//!
//! Rule fields reference other variables with Tera syntax (`{{ NAME }}`). Two
//! operations are provided:
//!
//! - [`references`] - which declared variables a string depends on, used by the
//!   resolver to order generation
//! - [`render`] - evaluate the string against the values generated so far
//!
//! # Supported Features
//!
//! - Variable substitution: `{{ DB_HOST }}`
//! - Filters: `{{ NAME | upper }}`, `{{ PORT | int }}`
//! - Arithmetic: `{{ PORT | int + 1 }}`
//! - Conditionals: `{% if MODE == "prod" %}...{% endif %}`

pub mod references;
pub mod renderer;

pub use references::{has_markers, references};
pub use renderer::{format_tera_error, render};
