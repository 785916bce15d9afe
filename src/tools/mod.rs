pub mod duckduckgo;
pub mod fetcher;
pub mod llm;
pub mod prompts;
pub mod search;
pub mod tavily;

pub use duckduckgo::DuckDuckGoSearch;
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use llm::{InferenceClient, LanguageModel, RigModel};
pub use search::{SearchGateway, SearchProvider};
pub use tavily::TavilySearch;
