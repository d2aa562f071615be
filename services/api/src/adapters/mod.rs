pub mod db;
pub mod documents;
pub mod generation_llm;
pub mod memory;
pub mod sentiment;
pub mod timed;

pub use db::DbAdapter;
pub use generation_llm::OpenAiGenerationAdapter;
pub use memory::InMemoryProfileStore;
pub use sentiment::VaderSentimentAdapter;
pub use timed::TimedProfileStore;
