//! Terminal output: report rendering, preamble lines and fetch progress
//!
//! Falls back to plain output when stderr is not an interactive terminal.
//!
//! # Example
//!
//! ```rust,ignore
//! use depreport::ui::{self, Marks, UiContext, FetchProgress};
//!
//! let ctx = UiContext::detect(true);
//! ui::step_info("Reading glide.yaml file");
//!
//! let progress = FetchProgress::new(&ctx);
//! progress.start(12);
//!
//! let mut out = std::io::stdout().lock();
//! ui::section(&mut out, "Direct Imports")?;
//! ui::analysis(&mut out, &Marks::new(ctx.use_color()), "github.com/foo/bar", &findings)?;
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{analysis, section, step_info, step_warn, title, Marks};
pub use progress::FetchProgress;
