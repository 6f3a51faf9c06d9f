//! Region selection strategies with several candidates.

use super::cache::CachedSamplerPlaybackInfo;
use super::{VoicePlayInfo, VoicePlayParameter};
use crate::parser::{Error, Result};
use crate::types::CompiledRegion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Always plays the same region
#[derive(Clone, Debug)]
pub struct SimpleVoicePlayer {
    data: CachedSamplerPlaybackInfo,
    line: usize,
}

impl SimpleVoicePlayer {
    pub fn new(region: &CompiledRegion, midi_pitch: i32, sample_index: usize) -> Self {
        Self {
            data: CachedSamplerPlaybackInfo::new(region, midi_pitch, sample_index),
            line: region.line,
        }
    }

    /// 0-based line of the region in the instrument text
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn play(&self, info: &mut VoicePlayInfo, params: &VoicePlayParameter) {
        self.data.to_play_info(info, params);
    }
}

#[derive(Clone, Debug)]
struct RandomEntry {
    data: CachedSamplerPlaybackInfo,
    /// Upper bound in the cumulative table: the region's `hirand`
    upper: f32,
}

/// Picks one of its regions at random by `lorand`/`hirand`
///
/// Each entry owns the part of `[0, 1)` below its `hirand` that no earlier
/// entry claims. Entries must be added in ascending range order, so that the
/// table is monotonic; a draw at or above the last `hirand` misses.
#[derive(Clone, Debug)]
pub struct RandomVoicePlayer {
    entries: Vec<RandomEntry>,
    rng: StdRng,
    finalized: bool,
}

impl RandomVoicePlayer {
    /// Player drawing from an OS-seeded generator
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Player with a reproducible sequence of draws
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            entries: Vec::new(),
            rng,
            finalized: false,
        }
    }

    /// A finalized player over `(region, sample_index)` pairs, in order
    pub fn from_regions<'a>(
        rng: StdRng,
        regions: impl IntoIterator<Item = (&'a CompiledRegion, usize)>,
        midi_pitch: i32,
    ) -> Self {
        let mut player = Self::with_rng(rng);
        for (region, sample_index) in regions {
            player.push(region, sample_index, midi_pitch);
        }
        player.finalize();
        player
    }

    pub fn add_entry(
        &mut self,
        region: &CompiledRegion,
        sample_index: usize,
        midi_pitch: i32,
    ) -> Result<()> {
        if self.finalized {
            return Err(Error::AlreadyFinalized);
        }
        self.push(region, sample_index, midi_pitch);
        Ok(())
    }

    fn push(&mut self, region: &CompiledRegion, sample_index: usize, midi_pitch: i32) {
        self.entries.push(RandomEntry {
            data: CachedSamplerPlaybackInfo::new(region, midi_pitch, sample_index),
            upper: region.hirand.clamp(0.0, 1.0),
        });
    }

    /// Close the player to new entries; later calls do nothing
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        if self.entries.windows(2).any(|w| w[1].upper < w[0].upper) {
            log::warn!("random regions are not in ascending hirand order; some never play");
        }
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn play(&mut self, info: &mut VoicePlayInfo, params: &VoicePlayParameter) {
        info.valid = false;
        if !self.finalized || self.entries.is_empty() {
            return;
        }
        let draw: f32 = self.rng.random();
        if let Some(entry) = self.entries.iter().find(|e| draw < e.upper) {
            entry.data.to_play_info(info, params);
        }
    }
}

impl Default for RandomVoicePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct RoundRobinEntry {
    data: CachedSamplerPlaybackInfo,
    seq_position: i32,
}

/// Cycles through its regions in `seq_position` order
///
/// The cursor is shared by every query, whatever pitch or velocity.
#[derive(Clone, Debug, Default)]
pub struct RoundRobinVoicePlayer {
    entries: Vec<RoundRobinEntry>,
    current: usize,
    finalized: bool,
}

impl RoundRobinVoicePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A finalized player over `(region, sample_index)` pairs
    pub fn from_regions<'a>(
        regions: impl IntoIterator<Item = (&'a CompiledRegion, usize)>,
        midi_pitch: i32,
    ) -> Self {
        let mut player = Self::new();
        for (region, sample_index) in regions {
            player.push(region, sample_index, midi_pitch);
        }
        player.finalize();
        player
    }

    pub fn add_entry(
        &mut self,
        region: &CompiledRegion,
        sample_index: usize,
        midi_pitch: i32,
    ) -> Result<()> {
        if self.finalized {
            return Err(Error::AlreadyFinalized);
        }
        self.push(region, sample_index, midi_pitch);
        Ok(())
    }

    fn push(&mut self, region: &CompiledRegion, sample_index: usize, midi_pitch: i32) {
        self.entries.push(RoundRobinEntry {
            data: CachedSamplerPlaybackInfo::new(region, midi_pitch, sample_index),
            seq_position: region.seq_position,
        });
    }

    /// Order entries by `seq_position`; later calls do nothing
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        // stable, so equal positions keep insertion order
        self.entries.sort_by_key(|e| e.seq_position);
        self.current = 0;
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn play(&mut self, info: &mut VoicePlayInfo, params: &VoicePlayParameter) {
        info.valid = false;
        if !self.finalized || self.entries.is_empty() {
            return;
        }
        let entry = &self.entries[self.current];
        entry.data.to_play_info(info, params);
        self.current = (self.current + 1) % self.entries.len();
    }
}
