//! Compiled instrument types.

use crate::parser::{CompiledOpcodes, DiscreteValue, Error, Opcode, Result};

/// One playable zone, validated and fixed at compile time
///
/// Key bounds use -1 as "not set". An unset `lokey`/`hikey` does not filter
/// anything, which keeps drum regions that only carry `key=` playable.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledRegion {
    /// Lowest key, or -1 for no lower bound
    pub lokey: i32,
    /// Highest key, or -1 for no upper bound
    pub hikey: i32,
    /// The single key this region answers to, or -1
    pub onlykey: i32,
    /// Key at which the sample plays unshifted, or -1
    pub keycenter: i32,
    /// Sample reference, with `default_path` already applied
    pub sample_file: String,
    pub lovel: i32,
    pub hivel: i32,
    /// Release time in seconds
    pub ampeg_release: f32,
    /// Velocity tracking in percent (0-100)
    pub amp_veltrack: f32,
    pub lorand: f32,
    pub hirand: f32,
    pub seq_length: i32,
    pub seq_position: i32,
    /// `None` when unset or not a known loop mode
    pub loop_mode: Option<DiscreteValue>,
    /// `None` when unset or not a known trigger
    pub trigger: Option<DiscreteValue>,
    /// 0-based line of the `<region>` tag
    pub line: usize,
}

impl Default for CompiledRegion {
    fn default() -> Self {
        Self {
            lokey: -1,
            hikey: -1,
            onlykey: -1,
            keycenter: -1,
            sample_file: String::new(),
            lovel: 0,
            hivel: 127,
            ampeg_release: 0.001,
            amp_veltrack: 100.0,
            lorand: 0.0,
            hirand: 1.0,
            seq_length: 1,
            seq_position: 1,
            loop_mode: None,
            trigger: None,
            line: 0,
        }
    }
}

impl CompiledRegion {
    /// Build a region from compiled opcodes
    ///
    /// Opcodes that do not shape a region (pan, volume, ...) are ignored;
    /// absent ones take their defaults.
    pub fn from_opcodes(opcodes: &CompiledOpcodes, line: usize) -> Result<Self> {
        let defaults = Self::default();
        let onlykey = opcodes.get_int(Opcode::Key).unwrap_or(defaults.onlykey);
        let keycenter = opcodes
            .get_int(Opcode::PitchKeycenter)
            .unwrap_or(onlykey);

        let region = Self {
            lokey: opcodes.get_int(Opcode::LoKey).unwrap_or(defaults.lokey),
            hikey: opcodes.get_int(Opcode::HiKey).unwrap_or(defaults.hikey),
            onlykey,
            keycenter,
            sample_file: opcodes
                .get_str(Opcode::Sample)
                .unwrap_or_default()
                .to_string(),
            lovel: opcodes.get_int(Opcode::LoVel).unwrap_or(defaults.lovel),
            hivel: opcodes.get_int(Opcode::HiVel).unwrap_or(defaults.hivel),
            ampeg_release: opcodes
                .get_float(Opcode::AmpegRelease)
                .unwrap_or(defaults.ampeg_release),
            amp_veltrack: opcodes
                .get_float(Opcode::AmpVeltrack)
                .unwrap_or(defaults.amp_veltrack)
                .clamp(0.0, 100.0),
            lorand: opcodes.get_float(Opcode::LoRand).unwrap_or(defaults.lorand),
            hirand: opcodes.get_float(Opcode::HiRand).unwrap_or(defaults.hirand),
            seq_length: opcodes
                .get_int(Opcode::SeqLength)
                .unwrap_or(defaults.seq_length),
            seq_position: opcodes
                .get_int(Opcode::SeqPosition)
                .unwrap_or(defaults.seq_position),
            loop_mode: known_discrete(opcodes, Opcode::LoopMode),
            trigger: known_discrete(opcodes, Opcode::Trigger),
            line,
        };
        region.validate()?;
        Ok(region)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::InvalidRegion {
            message,
            line: self.line + 1,
        };

        for (name, key) in [
            ("lokey", self.lokey),
            ("hikey", self.hikey),
            ("key", self.onlykey),
            ("pitch_keycenter", self.keycenter),
        ] {
            if !(-1..=127).contains(&key) {
                return Err(invalid(format!("{}={} is not a MIDI key", name, key)));
            }
        }
        if self.lokey != -1 && self.hikey != -1 && self.hikey < self.lokey {
            return Err(invalid(format!(
                "hikey={} is below lokey={}",
                self.hikey, self.lokey
            )));
        }
        for (name, vel) in [("lovel", self.lovel), ("hivel", self.hivel)] {
            if !(0..=127).contains(&vel) {
                return Err(invalid(format!("{}={} is not a MIDI velocity", name, vel)));
            }
        }
        if self.hivel < self.lovel {
            return Err(invalid(format!(
                "hivel={} is below lovel={}",
                self.hivel, self.lovel
            )));
        }
        Ok(())
    }

    /// Does a note at `pitch` fall into this region's key range?
    pub fn matches_pitch(&self, pitch: i32) -> bool {
        if self.onlykey != -1 {
            return pitch == self.onlykey;
        }
        (self.lokey == -1 || pitch >= self.lokey) && (self.hikey == -1 || pitch <= self.hikey)
    }

    pub fn matches_velocity(&self, velocity: i32) -> bool {
        velocity >= self.lovel && velocity <= self.hivel
    }

    pub fn matches(&self, pitch: i32, velocity: i32) -> bool {
        self.matches_pitch(pitch) && self.matches_velocity(velocity)
    }

    /// Whether the region sounds on note-off rather than note-on
    pub fn is_release_trigger(&self) -> bool {
        self.trigger == Some(DiscreteValue::Release)
    }

    /// Whether the region takes part in a round-robin sequence
    pub fn is_round_robin(&self) -> bool {
        self.seq_length > 1
    }
}

// unmapped discrete text is recorded at compile time and has no effect here
fn known_discrete(opcodes: &CompiledOpcodes, opcode: Opcode) -> Option<DiscreteValue> {
    opcodes
        .get_discrete(opcode)
        .filter(|value| *value != DiscreteValue::None)
}

/// A compiled instrument: regions plus the sample files they reference
///
/// Sample index `i + 1` refers to `sample_files()[i]`; index 0 is never
/// assigned, so a zero index always means "nothing to play".
#[derive(Clone, Debug, Default)]
pub struct Instrument {
    pub(crate) regions: Vec<CompiledRegion>,
    pub(crate) sample_indices: Vec<usize>,
    pub(crate) sample_files: Vec<String>,
}

impl Instrument {
    pub fn regions(&self) -> &[CompiledRegion] {
        &self.regions
    }

    pub fn num_regions(&self) -> usize {
        self.regions.len()
    }

    /// Unique sample files, in first-use order
    pub fn sample_files(&self) -> &[String] {
        &self.sample_files
    }

    /// Sample index (1-based) of the region at `region_index`
    pub fn sample_index(&self, region_index: usize) -> Option<usize> {
        self.sample_indices.get(region_index).copied()
    }

    /// Regions paired with their sample index
    pub fn iter(&self) -> impl Iterator<Item = (&CompiledRegion, usize)> {
        self.regions
            .iter()
            .zip(self.sample_indices.iter().copied())
    }

    /// Get a human-readable info string.
    pub fn info(&self) -> String {
        format!(
            "SFZ instrument: {} regions, {} samples",
            self.regions.len(),
            self.sample_files.len()
        )
    }
}
