pub mod config;
pub mod error;
pub mod http;
pub mod input;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod summary;
pub mod transcription;

pub use config::{GenerationProvider, PipelineConfig};
pub use error::{
    AcquisitionError, ConfigError, ErrorKind, GenerationError, PipelineError, TranscriptionError,
    TranscriptionErrorKind,
};
pub use input::InputReference;
pub use media::{AudioArtifact, MediaAcquirer, MediaExtractor, Provenance, YtDlpExtractor};
pub use pipeline::{Orchestrator, PipelineResult};
pub use summary::{SummaryFanout, SummaryKind, SummaryRecord, SummaryStrategy};
pub use transcription::{AssemblyAiClient, JobStatus, TranscriptionBackend, TranscriptionJob};
