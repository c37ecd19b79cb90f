//! Helper functions for rendering
//!
//! Date formatting in the site's locale and the small HTML utilities the
//! rich-text converter and templates rely on.

mod date;
mod html;

pub use date::*;
pub use html::*;
