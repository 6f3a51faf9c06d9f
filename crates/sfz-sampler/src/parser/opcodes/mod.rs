//! SFZ opcode schema
//!
//! The closed set of recognized opcodes, the value type each one expects,
//! and the type-directed compilation of raw `key=value` lists into
//! [`CompiledOpcodes`].
//!
//! # Example SFZ region with opcodes
//!
//! ```text
//! <region>
//! sample=piano C4.wav
//! lokey=c4 hikey=e4 pitch_keycenter=c4
//! lovel=64 hivel=127
//! ampeg_release=0.7
//! ```
//!
//! Unknown opcode names and values that do not convert are soft errors: the
//! pair is dropped, the name is recorded in the caller's
//! [`SamplerErrorContext`], and the rest of the list still compiles.
mod values;

pub use self::values::*;

use crate::parser::diagnostics::SamplerErrorContext;
use crate::parser::types::KeyValuePair;

/// Recognized opcode keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    HiKey,
    Key,
    LoKey,
    HiVel,
    LoVel,
    Sample,
    AmpegRelease,
    LoopMode,
    PitchKeycenter,
    LoopStart,
    LoopEnd,
    Pan,
    Group,
    Trigger,
    Volume,
    Tune,
    Offset,
    Polyphony,
    PitchKeytrack,
    AmpVeltrack,
    LoRand,
    HiRand,
    SeqLength,
    SeqPosition,
    DefaultPath,
    SwLabel,
    SwLast,
    SwLoKey,
    SwHiKey,
    SwDefault,
    HiCc64,
    LoCc64,
    /// Text that is not a recognized opcode
    None,
}

/// How an opcode's value text is converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeType {
    Int,
    Float,
    String,
    Discrete,
    Unknown,
}

impl Opcode {
    /// Every recognized opcode, excluding the `None` sentinel
    pub const ALL: [Opcode; 32] = [
        Opcode::HiKey,
        Opcode::Key,
        Opcode::LoKey,
        Opcode::HiVel,
        Opcode::LoVel,
        Opcode::Sample,
        Opcode::AmpegRelease,
        Opcode::LoopMode,
        Opcode::PitchKeycenter,
        Opcode::LoopStart,
        Opcode::LoopEnd,
        Opcode::Pan,
        Opcode::Group,
        Opcode::Trigger,
        Opcode::Volume,
        Opcode::Tune,
        Opcode::Offset,
        Opcode::Polyphony,
        Opcode::PitchKeytrack,
        Opcode::AmpVeltrack,
        Opcode::LoRand,
        Opcode::HiRand,
        Opcode::SeqLength,
        Opcode::SeqPosition,
        Opcode::DefaultPath,
        Opcode::SwLabel,
        Opcode::SwLast,
        Opcode::SwLoKey,
        Opcode::SwHiKey,
        Opcode::SwDefault,
        Opcode::HiCc64,
        Opcode::LoCc64,
    ];

    /// Look up an opcode by name without recording anything
    ///
    /// Unknown names return `Opcode::None`.
    pub fn from_name(name: &str) -> Opcode {
        match name {
            "hivel" => Opcode::HiVel,
            "lovel" => Opcode::LoVel,
            "hikey" => Opcode::HiKey,
            "lokey" => Opcode::LoKey,
            "hirand" => Opcode::HiRand,
            "lorand" => Opcode::LoRand,
            "pitch_keycenter" => Opcode::PitchKeycenter,
            "ampeg_release" => Opcode::AmpegRelease,
            "loop_mode" => Opcode::LoopMode,
            "loop_start" => Opcode::LoopStart,
            "loop_end" => Opcode::LoopEnd,
            "sample" => Opcode::Sample,
            "pan" => Opcode::Pan,
            "group" => Opcode::Group,
            "trigger" => Opcode::Trigger,
            "volume" => Opcode::Volume,
            "tune" => Opcode::Tune,
            "offset" => Opcode::Offset,
            "polyphony" => Opcode::Polyphony,
            "pitch_keytrack" => Opcode::PitchKeytrack,
            "amp_veltrack" => Opcode::AmpVeltrack,
            "key" => Opcode::Key,
            "seq_length" => Opcode::SeqLength,
            "seq_position" => Opcode::SeqPosition,
            "default_path" => Opcode::DefaultPath,
            "sw_label" => Opcode::SwLabel,
            "sw_last" => Opcode::SwLast,
            "sw_lokey" => Opcode::SwLoKey,
            "sw_hikey" => Opcode::SwHiKey,
            "sw_default" => Opcode::SwDefault,
            "hicc64" => Opcode::HiCc64,
            "locc64" => Opcode::LoCc64,
            _ => Opcode::None,
        }
    }

    /// The canonical name of this opcode, or `None` for the sentinel
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Opcode::HiVel => "hivel",
            Opcode::LoVel => "lovel",
            Opcode::HiKey => "hikey",
            Opcode::LoKey => "lokey",
            Opcode::HiRand => "hirand",
            Opcode::LoRand => "lorand",
            Opcode::PitchKeycenter => "pitch_keycenter",
            Opcode::AmpegRelease => "ampeg_release",
            Opcode::LoopMode => "loop_mode",
            Opcode::LoopStart => "loop_start",
            Opcode::LoopEnd => "loop_end",
            Opcode::Sample => "sample",
            Opcode::Pan => "pan",
            Opcode::Group => "group",
            Opcode::Trigger => "trigger",
            Opcode::Volume => "volume",
            Opcode::Tune => "tune",
            Opcode::Offset => "offset",
            Opcode::Polyphony => "polyphony",
            Opcode::PitchKeytrack => "pitch_keytrack",
            Opcode::AmpVeltrack => "amp_veltrack",
            Opcode::Key => "key",
            Opcode::SeqLength => "seq_length",
            Opcode::SeqPosition => "seq_position",
            Opcode::DefaultPath => "default_path",
            Opcode::SwLabel => "sw_label",
            Opcode::SwLast => "sw_last",
            Opcode::SwLoKey => "sw_lokey",
            Opcode::SwHiKey => "sw_hikey",
            Opcode::SwDefault => "sw_default",
            Opcode::HiCc64 => "hicc64",
            Opcode::LoCc64 => "locc64",
            Opcode::None => return None,
        };
        Some(name)
    }

    /// The value type this opcode expects
    pub fn value_type(self) -> OpcodeType {
        match self {
            Opcode::HiKey
            | Opcode::Key
            | Opcode::LoKey
            | Opcode::HiVel
            | Opcode::LoVel
            | Opcode::PitchKeycenter
            | Opcode::LoopStart
            | Opcode::LoopEnd
            | Opcode::Pan
            | Opcode::Group
            | Opcode::Tune
            | Opcode::Offset
            | Opcode::Polyphony
            | Opcode::PitchKeytrack
            | Opcode::SeqLength
            | Opcode::SeqPosition
            | Opcode::SwLast
            | Opcode::SwLoKey
            | Opcode::SwHiKey
            | Opcode::SwDefault
            | Opcode::HiCc64
            | Opcode::LoCc64 => OpcodeType::Int,
            Opcode::AmpegRelease
            | Opcode::Volume
            | Opcode::AmpVeltrack
            | Opcode::LoRand
            | Opcode::HiRand => OpcodeType::Float,
            Opcode::Sample | Opcode::DefaultPath | Opcode::SwLabel => OpcodeType::String,
            Opcode::LoopMode | Opcode::Trigger => OpcodeType::Discrete,
            Opcode::None => OpcodeType::Unknown,
        }
    }
}

/// Look up an opcode, recording unknown names in `ctx`
pub fn translate(name: &str, ctx: &mut SamplerErrorContext) -> Opcode {
    let opcode = Opcode::from_name(name);
    if opcode == Opcode::None {
        ctx.record_unrecognized(name);
    }
    opcode
}

/// The value type for opcode key text, without any diagnostics
///
/// The lexer uses this to decide whether the next identifier may contain
/// spaces.
pub fn key_text_to_type(key: &str) -> OpcodeType {
    Opcode::from_name(key).value_type()
}

/// Compile one pair into `results`, or drop it
pub fn compile_pair(
    ctx: &mut SamplerErrorContext,
    results: &mut CompiledOpcodes,
    input: &KeyValuePair,
) {
    let opcode = translate(&input.key, ctx);
    if opcode == Opcode::None {
        return;
    }

    let value_type = opcode.value_type();
    match Value::convert(value_type, &input.value) {
        Some(Value::Discrete(DiscreteValue::None)) => {
            log::warn!(
                "'{}' is not a discrete value (key={}, line {})",
                input.value,
                input.key,
                input.line + 1
            );
            ctx.record_invalid_value(&input.key, &input.value);
            results.add(opcode, Value::Discrete(DiscreteValue::None));
        }
        Some(value) => results.add(opcode, value),
        None => {
            log::warn!(
                "could not convert '{}' to {:?} (key={}, line {})",
                input.value,
                value_type,
                input.key,
                input.line + 1
            );
            ctx.record_invalid_value(&input.key, &input.value);
        }
    }
}

/// Compile a key/value list into typed opcode values
///
/// Each pair stands alone: an unrecognized key or unconvertible value drops
/// only that pair.
pub fn compile(ctx: &mut SamplerErrorContext, inputs: &[KeyValuePair]) -> CompiledOpcodes {
    let mut results = CompiledOpcodes::new();
    for input in inputs {
        compile_pair(ctx, &mut results, input);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_one_to_one() {
        for opcode in Opcode::ALL {
            let name = opcode.name().expect("recognized opcodes have a name");
            assert_eq!(Opcode::from_name(name), opcode);
            assert_ne!(opcode.value_type(), OpcodeType::Unknown);
        }
        assert_eq!(Opcode::None.name(), None);
        assert_eq!(Opcode::from_name("foo_bar"), Opcode::None);
    }

    #[test]
    fn test_key_text_to_type() {
        assert_eq!(key_text_to_type("sample"), OpcodeType::String);
        assert_eq!(key_text_to_type("lokey"), OpcodeType::Int);
        assert_eq!(key_text_to_type("lorand"), OpcodeType::Float);
        assert_eq!(key_text_to_type("loop_mode"), OpcodeType::Discrete);
        assert_eq!(key_text_to_type("piano.wav"), OpcodeType::Unknown);
    }

    #[test]
    fn test_compile_mixed_list() {
        let mut ctx = SamplerErrorContext::new();
        let inputs = vec![
            KeyValuePair::new("sample", "piano C4.wav"),
            KeyValuePair::new("lokey", "c4"),
            KeyValuePair::new("hikey", "64"),
            KeyValuePair::new("foo_bar", "1"),
            KeyValuePair::new("lovel", "loud"),
            KeyValuePair::new("ampeg_release", "0.5"),
            KeyValuePair::new("loop_mode", "one_shot"),
        ];

        let results = compile(&mut ctx, &inputs);

        assert_eq!(results.len(), 5);
        assert_eq!(results.get_str(Opcode::Sample), Some("piano C4.wav"));
        assert_eq!(results.get_int(Opcode::LoKey), Some(60));
        assert_eq!(results.get_int(Opcode::HiKey), Some(64));
        assert_eq!(results.get_float(Opcode::AmpegRelease), Some(0.5));
        assert_eq!(
            results.get_discrete(Opcode::LoopMode),
            Some(DiscreteValue::OneShot)
        );
        assert!(!results.contains(Opcode::LoVel));

        assert_eq!(ctx.unrecognized_opcodes().collect::<Vec<_>>(), vec!["foo_bar"]);
        assert_eq!(ctx.invalid_values().collect::<Vec<_>>(), vec!["lovel=loud"]);
    }

    #[test]
    fn test_unmapped_discrete_value_is_kept_as_none() {
        let mut ctx = SamplerErrorContext::new();
        let results = compile(&mut ctx, &[KeyValuePair::new("trigger", "sometimes")]);
        assert_eq!(results.get_discrete(Opcode::Trigger), Some(DiscreteValue::None));
        assert_eq!(ctx.invalid_values().count(), 1);
    }

    #[test]
    fn test_unrecognized_opcode_recorded_once() {
        let mut ctx = SamplerErrorContext::new();
        compile(&mut ctx, &[KeyValuePair::new("foo_bar", "1")]);
        compile(
            &mut ctx,
            &[
                KeyValuePair::new("foo_bar", "2"),
                KeyValuePair::new("key", "60"),
            ],
        );
        assert_eq!(ctx.unrecognized_opcodes().count(), 1);
    }
}
