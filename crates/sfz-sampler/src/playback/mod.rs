//! Real-time region selection
//!
//! A note-on is turned into a [`VoicePlayInfo`] by a [`VoicePlayer`]. Players
//! are built and finalized off the audio path; `play` never allocates, never
//! blocks and never fails. A miss is reported only through
//! [`VoicePlayInfo::valid`].

mod cache;
mod players;

pub use cache::{velocity_gain, CachedSamplerPlaybackInfo};
pub use players::{RandomVoicePlayer, RoundRobinVoicePlayer, SimpleVoicePlayer};

use crate::parser::DiscreteValue;

/// Query input: the note being played
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoicePlayParameter {
    pub midi_pitch: i32,
    /// 1..=127; 0 is note-off and never plays
    pub midi_velocity: i32,
}

/// Query result: what the synthesis engine should play
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoicePlayInfo {
    pub valid: bool,
    /// 1-based index into the instrument's sample list
    pub sample_index: usize,
    pub needs_transpose: bool,
    /// Resampling ratio, 1.0 at the keycenter
    pub transpose_amt: f32,
    pub gain: f32,
    pub ampeg_release: f32,
    /// How the synthesis engine should loop the sample, if the region says
    pub loop_mode: Option<DiscreteValue>,
}

impl Default for VoicePlayInfo {
    fn default() -> Self {
        Self {
            valid: false,
            sample_index: 0,
            needs_transpose: false,
            transpose_amt: 1.0,
            gain: 1.0,
            ampeg_release: 0.001,
            loop_mode: None,
        }
    }
}

impl VoicePlayInfo {
    pub fn can_play(&self) -> bool {
        self.valid && self.sample_index > 0
    }
}

/// One selection strategy for a (pitch, velocity layer) cell
#[derive(Clone, Debug, Default)]
pub enum VoicePlayer {
    /// Nothing to play
    #[default]
    Null,
    Single(SimpleVoicePlayer),
    WeightedRandom(RandomVoicePlayer),
    RoundRobin(RoundRobinVoicePlayer),
}

impl VoicePlayer {
    pub fn play(&mut self, info: &mut VoicePlayInfo, params: &VoicePlayParameter) {
        info.valid = false;
        match self {
            VoicePlayer::Null => {}
            VoicePlayer::Single(player) => player.play(info, params),
            VoicePlayer::WeightedRandom(player) => player.play(info, params),
            VoicePlayer::RoundRobin(player) => player.play(info, params),
        }
    }

    /// Close a multi-region player to further entries
    pub fn finalize(&mut self) {
        match self {
            VoicePlayer::WeightedRandom(player) => player.finalize(),
            VoicePlayer::RoundRobin(player) => player.finalize(),
            VoicePlayer::Null | VoicePlayer::Single(_) => {}
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, VoicePlayer::Null)
    }

    /// Short strategy name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            VoicePlayer::Null => "null",
            VoicePlayer::Single(_) => "single",
            VoicePlayer::WeightedRandom(_) => "random",
            VoicePlayer::RoundRobin(_) => "round-robin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompiledRegion;

    #[test]
    fn test_null_player_never_plays() {
        let mut player = VoicePlayer::Null;
        for velocity in [0, 1, 64, 127] {
            let mut info = VoicePlayInfo {
                valid: true,
                sample_index: 1,
                ..VoicePlayInfo::default()
            };
            player.play(
                &mut info,
                &VoicePlayParameter {
                    midi_pitch: 60,
                    midi_velocity: velocity,
                },
            );
            assert!(!info.valid);
            assert!(!info.can_play());
        }
    }

    #[test]
    fn test_can_play_needs_sample() {
        let info = VoicePlayInfo {
            valid: true,
            ..VoicePlayInfo::default()
        };
        assert!(!info.can_play());
    }

    #[test]
    fn test_single_through_enum() {
        let region = CompiledRegion {
            keycenter: 60,
            ..CompiledRegion::default()
        };
        let mut player = VoicePlayer::Single(SimpleVoicePlayer::new(&region, 64, 2));
        player.finalize();
        assert_eq!(player.kind(), "single");

        let mut info = VoicePlayInfo::default();
        player.play(
            &mut info,
            &VoicePlayParameter {
                midi_pitch: 64,
                midi_velocity: 127,
            },
        );
        assert!(info.can_play());
        assert!(info.needs_transpose);
        assert!((info.gain - 1.0).abs() < 1e-6);

        player.play(
            &mut info,
            &VoicePlayParameter {
                midi_pitch: 64,
                midi_velocity: 0,
            },
        );
        assert!(!info.valid);
    }
}
