pub mod config;
pub mod embedding;
pub mod similarity;
pub mod tfidf;
pub mod types;

pub use config::{BertEmbedder, E5Config};
pub use embedding::{DenseEmbeddingSource, Embedder, EmbeddingBank};
pub use similarity::{cosine_similarity, sparse_cosine_similarity, ContentSource};
pub use tfidf::{TfidfSource, TfidfVectorizer};
pub use types::*;

// Vector embedding and similarity configuration
pub const TARGET_VECTOR: &str = "article-embeddings";
pub const MODEL_URL: &str =
    "https://huggingface.co/intfloat/e5-large-v2/resolve/main/model.safetensors";
pub const TOKENIZER_URL: &str =
    "https://huggingface.co/intfloat/e5-large-v2/resolve/main/tokenizer.json";
