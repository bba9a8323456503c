//! Markdown rendering of notebook content

mod markdown;
mod text;

pub use markdown::{render, render_with, RenderOptions};
pub use text::tidy_recognized_text;
