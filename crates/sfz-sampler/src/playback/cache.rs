//! Per-region playback data computed once, off the audio path.

use super::{VoicePlayInfo, VoicePlayParameter};
use crate::parser::DiscreteValue;
use crate::types::CompiledRegion;

/// Gain for velocity `v` under `amp_veltrack` percent `t`
///
/// `x = v*t/100 + (100-t)*1.27`, then squared as a fraction of 127.
pub fn velocity_gain(velocity: i32, amp_veltrack: f32) -> f32 {
    let v = velocity as f32;
    let t = amp_veltrack;
    let x = v * t / 100.0 + (100.0 - t) * (127.0 / 100.0);
    let g = x / 127.0;
    g * g
}

/// Playback data for one region triggered at one pitch
#[derive(Clone, Debug)]
pub struct CachedSamplerPlaybackInfo {
    pub needs_transpose: bool,
    pub transpose_amt: f32,
    pub sample_index: usize,
    pub ampeg_release: f32,
    pub amp_veltrack: f32,
    pub loop_mode: Option<DiscreteValue>,
    gain_curve: [f32; 128],
}

impl CachedSamplerPlaybackInfo {
    pub fn new(region: &CompiledRegion, midi_pitch: i32, sample_index: usize) -> Self {
        let semi_offset = if region.keycenter == -1 {
            0
        } else {
            midi_pitch - region.keycenter
        };
        let (needs_transpose, transpose_amt) = if semi_offset == 0 {
            (false, 1.0)
        } else {
            (true, 2.0_f32.powf(semi_offset as f32 / 12.0))
        };

        let mut gain_curve = [0.0; 128];
        for (velocity, gain) in gain_curve.iter_mut().enumerate() {
            *gain = velocity_gain(velocity as i32, region.amp_veltrack);
        }

        Self {
            needs_transpose,
            transpose_amt,
            sample_index,
            ampeg_release: region.ampeg_release,
            amp_veltrack: region.amp_veltrack,
            loop_mode: region.loop_mode,
            gain_curve,
        }
    }

    /// Gain for a velocity in 1..=127
    pub fn gain(&self, velocity: i32) -> Option<f32> {
        if (1..=127).contains(&velocity) {
            Some(self.gain_curve[velocity as usize])
        } else {
            None
        }
    }

    /// Copy the cached data into `info`
    ///
    /// `info.valid` is only set when the query velocity is playable.
    pub fn to_play_info(&self, info: &mut VoicePlayInfo, params: &VoicePlayParameter) {
        let Some(gain) = self.gain(params.midi_velocity) else {
            info.valid = false;
            return;
        };
        info.sample_index = self.sample_index;
        info.needs_transpose = self.needs_transpose;
        info.transpose_amt = self.transpose_amt;
        info.ampeg_release = self.ampeg_release;
        info.loop_mode = self.loop_mode;
        info.gain = gain;
        info.valid = true;
    }
}
