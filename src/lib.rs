//! Narration playback workspace facade.
//!
//! Re-exports the core crates so host applications depend on a single crate
//! and pick their platform adapters with feature flags:
//!
//! - `desktop` (default): `bridge-desktop` headless output, SQLite store and
//!   host interaction source
//! - `wasm`: `bridge-wasm` browser adapters (only on `wasm32`)
//!
//! ```ignore
//! use narration_workspace::prelude::*;
//! use std::sync::Arc;
//!
//! let manager = PlaybackManager::builder()
//!     .audio_factory(Arc::new(desktop::HeadlessContextFactory::new()))
//!     .build()?;
//! ```

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

#[cfg(feature = "desktop")]
pub use bridge_desktop as desktop;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use bridge_wasm as wasm;

/// Types most hosts need.
pub mod prelude {
    pub use bridge_traits::{
        AudioBuffer, AudioContextFactory, CompletionCallback, ContextState, InteractionKind,
        InteractionSource, KeyValueStore, SpeechSynthesizer, Voice,
    };
    pub use core_playback::{
        NarrationConfig, PlaybackError, PlaybackManager, PlaybackStatus, PcmFormat,
    };
    pub use core_runtime::events::{CoreEvent, EventBus, NarrationEvent, OutputEvent};
    pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};

    #[cfg(feature = "desktop")]
    pub use crate::desktop;
}
