pub mod catalog;
pub mod loader;
pub mod text;
pub mod types;

pub use catalog::Catalog;
pub use loader::{load_click_histories, load_news_tsv, parse_behaviors, parse_news};
pub use text::clean_text;
pub use types::*;

pub const TARGET_NEWS: &str = "news";
