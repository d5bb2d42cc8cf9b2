//! Content module - front matter, page model, Markdown and collection

mod frontmatter;
pub mod loader;
mod markdown;
mod page;

pub use frontmatter::FrontMatter;
pub use loader::{Collection, ContentLoader};
pub use markdown::{highlight_css, Degradation, Fragment, MarkdownRenderer, RenderStatus};
pub use page::{parse_categories, Page, DATE_FORMAT};
