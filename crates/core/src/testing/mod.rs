//! Test doubles for the transcoder seams.
//!
//! ```rust,ignore
//! use segmenta_core::testing::{MockProber, MockTranscoder};
//!
//! let transcoder = MockTranscoder::new().with_progress(vec![50.0]);
//! let prober = MockProber::new().with_duration(12.5);
//! let pipeline = ConversionPipeline::new(&config, Arc::new(transcoder.clone()), Arc::new(prober));
//! ```

mod mock_prober;
mod mock_transcoder;

pub use mock_prober::MockProber;
pub use mock_transcoder::{MockTranscoder, RecordedTranscode, MOCK_PLAYLIST};
