//! SFZ instrument compiler and real-time sample selection.
//!
//! This crate turns SFZ instrument text into validated regions and answers
//! note-on queries with a playback directive:
//! - Character-level lexing with `#include` delegated to a callback
//! - Typed opcode compilation with non-fatal diagnostics
//! - Region inheritance from `<global>`, `<master>` and `<group>`
//! - Single, weighted-random and round-robin region selection
//!
//! # Architecture
//!
//! The crate is independent of the audio backend and never touches the file
//! system. It provides:
//! - A loader that compiles text into an [`Instrument`]
//! - A [`PlayerMap`] that resolves (pitch, velocity) to a [`VoicePlayInfo`]
//!   without allocating, for use on the audio thread
//!
//! Sample data, voice allocation and resampling belong to the host.
//!
//! # Example
//!
//! ```
//! use sfz_sampler::{
//!     load_instrument_str, PlayerMap, SamplerConfig, SamplerErrorContext, VoicePlayInfo,
//!     VoicePlayParameter,
//! };
//!
//! let config = SamplerConfig::default();
//! let mut ctx = SamplerErrorContext::new();
//! let instrument = load_instrument_str(
//!     "<region> sample=piano C4.wav lokey=48 hikey=72 pitch_keycenter=60",
//!     &config,
//!     &mut ctx,
//!     None,
//! )?;
//!
//! let mut players = PlayerMap::build(&instrument, &config);
//! let mut info = VoicePlayInfo::default();
//! players.play(&mut info, &VoicePlayParameter { midi_pitch: 72, midi_velocity: 127 });
//!
//! assert!(info.can_play());
//! assert_eq!(instrument.sample_files()[info.sample_index - 1], "piano C4.wav");
//! assert!((info.transpose_amt - 2.0).abs() < 1e-5);
//! # Ok::<(), sfz_sampler::Error>(())
//! ```

pub mod config;
pub mod loader;
pub mod parser;
pub mod playback;
pub mod region_matcher;
pub mod types;

pub use config::SamplerConfig;
pub use loader::*;
pub use playback::{VoicePlayInfo, VoicePlayParameter, VoicePlayer};
pub use region_matcher::*;
pub use types::*;

// Re-export parser types for convenience
pub use parser::{Error, IncludeHandler, Result, SamplerErrorContext};
