//! Content module - post models, rich text and derived display data

pub mod navigation;
mod post;
pub mod reading;
pub mod richtext;

pub use navigation::{NavigationResolver, NavigationResult};
pub use post::{ContentSection, PostDetail, PostSummary};
pub use reading::{PostDeriver, ReadingMeta};
pub use richtext::RichTextBlock;
