pub mod pipeline;
pub mod recognizer;
pub mod store;

pub use pipeline::{DocumentKind, DocumentPipeline, PipelineError, ProcessedDocument};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError};
pub use store::{document_path, sha256_bytes, to_hex, write_atomic};
