//! Content module - front-matter, markdown rendering, and the post collection

mod error;
mod frontmatter;
mod markdown;
mod post;
mod repository;

pub use error::{ContentError, SlugConflict};
pub use frontmatter::{parse_date, FrontMatter, FrontMatterError};
pub use markdown::{Heading, MarkdownRenderer, RenderedBody, MORE_MARKER};
pub use post::Post;
pub use repository::{slug_for, LoadOptions, LoadPolicy, PostRepository};
