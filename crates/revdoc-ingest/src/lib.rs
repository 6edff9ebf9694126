//! Review ingestion: duplicate rejection, brand identity resolution,
//! persistence, and the asynchronous enrichment batch.

pub mod brand;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod pipeline;

pub use brand::{
    extract_pure_brand_name, normalize_key, prefix3, same_brand_group, similarity, BrandCache,
    BrandEntry, BrandIdentityResolver, SIMILARITY_THRESHOLD,
};
pub use dedup::RecentIdCache;
pub use enrich::{
    EnrichmentBatch, EnrichmentSettings, EnrichmentSummary, Enricher, LexiconEnricher,
};
pub use error::{EnrichError, IngestError};
pub use pipeline::{
    DuplicateSource, IngestDecision, IngestOutcome, PipelineSettings, ReviewIngestionPipeline,
};
