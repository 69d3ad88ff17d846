pub mod db;
pub mod mood_llm;

pub use db::DbAdapter;
pub use mood_llm::GatewayMoodAdapter;
