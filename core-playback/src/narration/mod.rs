//! # Narration Sequencer
//!
//! Turns long-form text into an ordered sequence of sentence-sized chunks and
//! drives the platform speech engine through them one at a time.
//!
//! ## Job Lifecycle
//!
//! ```text
//! idle ──speak──> running ──(chunk i ends or fails)──> chunk i+1 ... ──> done
//!                    │                                                    ^
//!                    └──────────────stop / newer speak───────────────────┘
//! ```
//!
//! - Failed chunks are skipped; one bad sentence never aborts the narration.
//! - Stops are observed at chunk boundaries. The platform queue is cleared
//!   immediately so no further audio is produced.
//! - The voice is resolved once per job and reused for every chunk.

mod segment;
mod sequencer;
mod voice;

pub use segment::segment;
pub use sequencer::{NarrationSequencer, NarrationStatus};
pub use voice::select_voice;
