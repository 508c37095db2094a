pub mod errors;
pub mod models;
pub mod url_parser;

pub use errors::ParseError;
pub use models::{ContentCategory, ContentClassification, InstagramLink, MediaKind};
pub use url_parser::{classify, extract_shortcode};
