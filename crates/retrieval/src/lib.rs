mod retriever;
mod tokenizer;

pub use retriever::{RetrievalQuery, Retriever, DEFAULT_RETRIEVAL_LIMIT};
pub use tokenizer::{tokenize, MIN_TOKEN_CHARS};
