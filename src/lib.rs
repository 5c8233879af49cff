//! Specmend - AI-assisted OpenAPI mutation engine
//!
//! Specmend decides whether a natural-language fix request against an
//! OpenAPI document can be expressed as a minimal RFC 6902 patch set or
//! needs a full regeneration, executes the chosen path with atomic
//! fallback, and caches results so identical or structurally equivalent
//! work is never recomputed.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture:
//!
//! - **Domain Layer** (`domain`): models, JSON Pointer navigation, the
//!   language-model port, and the error taxonomy
//! - **Service Layer** (`services`): decision engine, patch generator,
//!   patch applier, cache engine, and the mutation orchestrator
//! - **Infrastructure Layer** (`infrastructure`): the Anthropic adapter,
//!   configuration, logging, and document IO
//! - **CLI Layer** (`cli`): command-line interface
//!
//! All cache state is in-process and ephemeral; a restart clears every
//! namespace.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{MutationError, MutationResult};
pub use domain::models::{
    CacheConfig, Config, DecisionResult, Document, Finding, FixRequest, LlmConfig, LoggingConfig,
    MutationMethod, MutationOutcome, MutationReport, PatchOp, PatchOperation, PatchSet,
};
pub use domain::ports::{ChatMessage, LlmClient, LlmResult, StreamChunk};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    CacheService, DecisionEngine, MutationOrchestrator, MutationRequest, PatchApplier,
    PatchGenerator, SignatureCache,
};
