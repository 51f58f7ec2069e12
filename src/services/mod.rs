// Collaborators around the engine: reading folders, digests, presentation,
// file removal and the deletion log.

pub mod delete;
pub mod hash;
pub mod history;
pub mod report;
pub mod scanner;
