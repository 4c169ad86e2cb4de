//! Extraction pipeline: raw page grid → normalized rows → typed records →
//! confidence-rated snapshot.
//!
//! Each stage is a pure function of its input. Grid detection itself is a
//! collaborator behind [`GridSource`]; the pipeline tries configured
//! strategies in order until one yields an adequate document.

pub mod error;
pub mod extractor;
pub mod fields;
pub mod fused;
pub mod grid;
pub mod headers;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod strategy;
pub mod validate;

pub use error::{DetectError, ExtractError, PipelineError};
pub use extractor::{FieldExtractor, RowRejection};
pub use fused::{FusedSplitter, Shape};
pub use grid::PageGrid;
pub use headers::{canonicalize, compact, HeaderMatch};
pub use layout::LayoutTextSource;
pub use normalize::{NormalizedDocument, NormalizedRow, Normalizer};
pub use pipeline::{Attempt, AttemptOutcome, Candidate, Extraction, Pipeline};
pub use strategy::{GridSource, NamedGrids, StaticGrid};
pub use validate::{DocumentDiagnostic, RecordValidator, SequenceGap, TotalCheck};
