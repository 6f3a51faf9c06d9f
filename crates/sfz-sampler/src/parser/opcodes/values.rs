use std::collections::HashMap;

use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{all_consuming, map, map_res, opt, recognize};
use nom::sequence::pair;
use nom::IResult;

use super::{Opcode, OpcodeType};

/// Trait for parsing opcode values
///
/// In SFZ all values are text in the file, but each opcode expects one
/// particular type. Conversion failures are soft: `None` means the
/// `key=value` pair is dropped and compilation moves on.
pub trait OpcodeValue: Sized {
    /// Parse an opcode value from its text, or `None` if it does not convert
    fn parse_opcode(s: &str) -> Option<Self>;
}

impl OpcodeValue for i32 {
    /// Integer values are either plain numbers or note names
    ///
    /// ```text
    /// key=60      // plain MIDI note number
    /// lokey=c4    // 60
    /// hikey=c#4   // 61
    /// ```
    fn parse_opcode(s: &str) -> Option<Self> {
        parse_int_value(s)
    }
}

impl OpcodeValue for f32 {
    /// `nan` and `inf` parse as floats but are not opcode values
    fn parse_opcode(s: &str) -> Option<Self> {
        s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
    }
}

impl OpcodeValue for String {
    /// String values (sample paths, labels) are used verbatim
    fn parse_opcode(s: &str) -> Option<Self> {
        Some(s.to_string())
    }
}

impl OpcodeValue for DiscreteValue {
    fn parse_opcode(s: &str) -> Option<Self> {
        match DiscreteValue::from_text(s) {
            DiscreteValue::None => None,
            value => Some(value),
        }
    }
}

/// Named loop and trigger modes
///
/// ```text
/// loop_mode=loop_continuous
/// loop_mode=one_shot
/// trigger=release
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscreteValue {
    /// The sample loops until the voice is done
    LoopContinuous,
    /// The sample loops until note-off, then plays to the end
    LoopSustain,
    /// The sample plays once and stops
    NoLoop,
    /// The sample plays once, ignoring note-off
    OneShot,
    /// Triggered on note-on
    Attack,
    /// Triggered on note-off
    Release,
    /// Text that is not a known discrete value
    None,
}

impl DiscreteValue {
    /// Look up discrete value text; unknown text maps to `DiscreteValue::None`
    pub fn from_text(text: &str) -> Self {
        match text {
            "loop_continuous" => Self::LoopContinuous,
            "loop_sustain" => Self::LoopSustain,
            "no_loop" => Self::NoLoop,
            "one_shot" => Self::OneShot,
            "attack" => Self::Attack,
            "release" => Self::Release,
            _ => Self::None,
        }
    }
}

/// A converted opcode value; the variant always matches the opcode's type
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    String(String),
    Discrete(DiscreteValue),
}

impl Value {
    /// Convert `text` according to `value_type`
    ///
    /// Returns `None` when the text does not convert. Discrete text that is
    /// not in the table is *not* a failure here: it yields
    /// `Value::Discrete(DiscreteValue::None)`.
    pub fn convert(value_type: OpcodeType, text: &str) -> Option<Self> {
        match value_type {
            OpcodeType::Int => i32::parse_opcode(text).map(Value::Int),
            OpcodeType::Float => f32::parse_opcode(text).map(Value::Float),
            OpcodeType::String => String::parse_opcode(text).map(Value::String),
            OpcodeType::Discrete => Some(Value::Discrete(
                DiscreteValue::parse_opcode(text).unwrap_or(DiscreteValue::None),
            )),
            OpcodeType::Unknown => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_discrete(&self) -> Option<DiscreteValue> {
        match self {
            Value::Discrete(v) => Some(*v),
            _ => None,
        }
    }
}

/// The typed result of compiling one key/value list
///
/// A later assignment to the same opcode replaces an earlier one, which is
/// what makes region opcodes override inherited group opcodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledOpcodes {
    values: HashMap<Opcode, Value>,
}

impl CompiledOpcodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, opcode: Opcode, value: Value) {
        self.values.insert(opcode, value);
    }

    pub fn get(&self, opcode: Opcode) -> Option<&Value> {
        self.values.get(&opcode)
    }

    pub fn get_int(&self, opcode: Opcode) -> Option<i32> {
        self.get(opcode).and_then(Value::as_int)
    }

    pub fn get_float(&self, opcode: Opcode) -> Option<f32> {
        self.get(opcode).and_then(Value::as_float)
    }

    pub fn get_str(&self, opcode: Opcode) -> Option<&str> {
        self.get(opcode).and_then(Value::as_str)
    }

    pub fn get_discrete(&self, opcode: Opcode) -> Option<DiscreteValue> {
        self.get(opcode).and_then(Value::as_discrete)
    }

    pub fn contains(&self, opcode: Opcode) -> bool {
        self.values.contains_key(&opcode)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Layer `other` on top of `self`; its values win
    pub fn merge(&mut self, other: &CompiledOpcodes) {
        for (opcode, value) in &other.values {
            self.values.insert(*opcode, value.clone());
        }
    }
}

// a=9, b=11, c=0 ... g=7; an optional '#' raises by one semitone
fn note_prefix(input: &str) -> IResult<&str, i32> {
    map(
        pair(one_of("abcdefgABCDEFG"), opt(char('#'))),
        |(letter, sharp): (char, Option<char>)| {
            let pitch_class = match letter.to_ascii_lowercase() {
                'a' => 9,
                'b' => 11,
                'c' => 0,
                'd' => 2,
                'e' => 4,
                'f' => 5,
                _ => 7,
            };
            pitch_class + i32::from(sharp.is_some())
        },
    )(input)
}

fn signed_int(input: &str) -> IResult<&str, i32> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i32>()
    })(input)
}

/// Parse an integer opcode value, accepting note names
///
/// A note name is a letter `a`..`g`, an optional `#`, then the octave number;
/// it converts to `octave * 12 + 12 + pitch_class`, so `c4` is 60 and `a0`
/// is 21. Anything left over after the number makes the value invalid.
pub fn parse_int_value(text: &str) -> Option<i32> {
    let (_, (pitch_class, number)) =
        all_consuming(pair(opt(note_prefix), signed_int))(text.trim()).ok()?;
    match pitch_class {
        Some(pitch_class) => number
            .checked_mul(12)?
            .checked_add(12 + pitch_class),
        None => Some(number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_names() {
        assert_eq!(parse_int_value("c4"), Some(60));
        assert_eq!(parse_int_value("c#4"), Some(61));
        assert_eq!(parse_int_value("a0"), Some(21));
        assert_eq!(parse_int_value("b3"), Some(59));
        assert_eq!(parse_int_value("C4"), Some(60));
        assert_eq!(parse_int_value("c-1"), Some(0));
    }

    #[test]
    fn test_plain_integers() {
        assert_eq!(parse_int_value("60"), Some(60));
        assert_eq!(parse_int_value("-1"), Some(-1));
        assert_eq!(parse_int_value(" 7 "), Some(7));
    }

    #[test]
    fn test_invalid_integers() {
        assert_eq!(parse_int_value(""), None);
        assert_eq!(parse_int_value("c"), None);
        assert_eq!(parse_int_value("c#"), None);
        assert_eq!(parse_int_value("h4"), None);
        assert_eq!(parse_int_value("12abc"), None);
        assert_eq!(parse_int_value("1.5"), None);
        assert_eq!(parse_int_value("c999999999"), None);
    }

    #[test]
    fn test_convert_by_type() {
        assert_eq!(Value::convert(OpcodeType::Float, ".2"), Some(Value::Float(0.2)));
        assert_eq!(Value::convert(OpcodeType::Float, "fast"), None);
        assert_eq!(
            Value::convert(OpcodeType::String, "piano C4.wav"),
            Some(Value::String("piano C4.wav".to_string()))
        );
        assert_eq!(
            Value::convert(OpcodeType::Discrete, "one_shot"),
            Some(Value::Discrete(DiscreteValue::OneShot))
        );
        assert_eq!(
            Value::convert(OpcodeType::Discrete, "sometimes"),
            Some(Value::Discrete(DiscreteValue::None))
        );
        assert_eq!(Value::convert(OpcodeType::Unknown, "1"), None);
    }

    #[test]
    fn test_non_finite_floats_do_not_convert() {
        for text in ["nan", "NaN", "inf", "-inf", "infinity"] {
            assert_eq!(Value::convert(OpcodeType::Float, text), None, "{}", text);
        }
        assert_eq!(Value::convert(OpcodeType::Float, "1e3"), Some(Value::Float(1000.0)));
    }

    #[test]
    fn test_later_assignment_replaces_earlier() {
        let mut opcodes = CompiledOpcodes::new();
        opcodes.add(Opcode::LoKey, Value::Int(10));
        opcodes.add(Opcode::LoKey, Value::Int(20));
        assert_eq!(opcodes.len(), 1);
        assert_eq!(opcodes.get_int(Opcode::LoKey), Some(20));
        assert_eq!(opcodes.get_float(Opcode::LoKey), None);
    }

    #[test]
    fn test_merge_overrides() {
        let mut group = CompiledOpcodes::new();
        group.add(Opcode::LoKey, Value::Int(10));
        group.add(Opcode::HiKey, Value::Int(20));

        let mut region = CompiledOpcodes::new();
        region.add(Opcode::HiKey, Value::Int(15));

        group.merge(&region);
        assert_eq!(group.get_int(Opcode::LoKey), Some(10));
        assert_eq!(group.get_int(Opcode::HiKey), Some(15));
    }
}
