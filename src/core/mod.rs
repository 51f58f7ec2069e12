// Duplicate detection stages, leaf-first:
// normalize -> vectorize -> similarity -> cluster -> summary.

pub mod cluster;
pub mod corpus;
pub mod normalize;
pub mod similarity;
pub mod summary;
pub mod vectorize;
