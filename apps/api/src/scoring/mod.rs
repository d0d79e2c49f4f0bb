// Fit scoring engine: skill coverage, experience adequacy, semantic similarity.
// Everything here is synchronous; handlers move it onto the blocking pool.

pub mod experience;
pub mod fit;
pub mod handlers;
pub mod mandatory_skills;
pub mod semantic;
pub mod skill_library;
pub mod tokenizer;
