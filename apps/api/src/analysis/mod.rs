// Skill-gap analysis: extraction, comparison, recommendations and the orchestrator
// that chooses between the LLM and the deterministic pipeline.

pub mod comparator;
pub mod extractor;
pub mod handlers;
pub mod llm_analysis;
pub mod orchestrator;
pub mod prompts;
pub mod recommender;
pub mod skills;
pub mod summary;
pub mod vocabulary;
