//! Region matching: which player answers a (pitch, velocity) query.

use crate::config::SamplerConfig;
use crate::playback::{
    RandomVoicePlayer, RoundRobinVoicePlayer, SimpleVoicePlayer, VoicePlayInfo,
    VoicePlayParameter, VoicePlayer,
};
use crate::types::{CompiledRegion, Instrument};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Number of MIDI pitches
pub const NUM_PITCHES: usize = 128;

/// The player for one velocity layer of one pitch
#[derive(Clone, Debug)]
pub struct VelocityLayer {
    pub lovel: i32,
    pub hivel: i32,
    pub player: VoicePlayer,
}

impl VelocityLayer {
    pub fn contains(&self, velocity: i32) -> bool {
        velocity >= self.lovel && velocity <= self.hivel
    }
}

/// Players for every pitch of an instrument, built once and queried per note
///
/// For each pitch, the regions that match it are grouped by velocity layer
/// `(lovel, hivel)` and each group becomes one player:
/// - one region: [`VoicePlayer::Single`]
/// - several, any with `seq_length > 1`: [`VoicePlayer::RoundRobin`]
/// - several otherwise: [`VoicePlayer::WeightedRandom`]
///
/// A pitch with no regions has no layers and never plays.
#[derive(Clone, Debug)]
pub struct PlayerMap {
    pitches: Vec<Vec<VelocityLayer>>,
}

impl PlayerMap {
    /// Build players for every pitch of `instrument`
    pub fn build(instrument: &Instrument, config: &SamplerConfig) -> Self {
        let mut pitches = Vec::with_capacity(NUM_PITCHES);
        let mut players = 0;

        for pitch in 0..NUM_PITCHES as i32 {
            let layers = build_layers(instrument, pitch, config);
            players += layers.len();
            pitches.push(layers);
        }

        log::info!(
            "Built {} voice players for {} regions",
            players,
            instrument.num_regions()
        );

        Self { pitches }
    }

    /// Resolve a note to playback parameters
    ///
    /// `info.valid` is false when nothing matches, when the pitch is outside
    /// 0..=127 or when the velocity is outside 1..=127.
    pub fn play(&mut self, info: &mut VoicePlayInfo, params: &VoicePlayParameter) {
        info.valid = false;
        if !(1..=127).contains(&params.midi_velocity) {
            return;
        }
        let Some(layers) = usize::try_from(params.midi_pitch)
            .ok()
            .and_then(|pitch| self.pitches.get_mut(pitch))
        else {
            return;
        };
        if let Some(layer) = layers
            .iter_mut()
            .find(|layer| layer.contains(params.midi_velocity))
        {
            layer.player.play(info, params);
        }
    }

    /// Velocity layers for one pitch
    pub fn layers(&self, pitch: i32) -> &[VelocityLayer] {
        usize::try_from(pitch)
            .ok()
            .and_then(|pitch| self.pitches.get(pitch))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn build_layers(instrument: &Instrument, pitch: i32, config: &SamplerConfig) -> Vec<VelocityLayer> {
    // (lovel, hivel) buckets, in order of first appearance
    let mut buckets: Vec<((i32, i32), Vec<(&CompiledRegion, usize)>)> = Vec::new();
    for (region, sample_index) in instrument.iter() {
        // note-off regions never answer a note-on
        if region.is_release_trigger() || !region.matches_pitch(pitch) {
            continue;
        }
        let key = (region.lovel, region.hivel);
        match buckets.iter_mut().find(|(k, _)| *k == key) {
            Some((_, entries)) => entries.push((region, sample_index)),
            None => buckets.push((key, vec![(region, sample_index)])),
        }
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(layer, ((lovel, hivel), entries))| VelocityLayer {
            lovel,
            hivel,
            player: build_player(&entries, pitch, layer, config),
        })
        .collect()
}

fn build_player(
    entries: &[(&CompiledRegion, usize)],
    pitch: i32,
    layer: usize,
    config: &SamplerConfig,
) -> VoicePlayer {
    let regions = entries.iter().copied();
    let player = match entries {
        [] => return VoicePlayer::Null,
        [(region, sample_index)] => {
            return VoicePlayer::Single(SimpleVoicePlayer::new(region, pitch, *sample_index))
        }
        _ if entries.iter().any(|(region, _)| region.is_round_robin()) => {
            VoicePlayer::RoundRobin(RoundRobinVoicePlayer::from_regions(regions, pitch))
        }
        _ => {
            let rng = match config.random_seed {
                Some(seed) => StdRng::seed_from_u64(layer_seed(seed, pitch, layer)),
                None => StdRng::from_os_rng(),
            };
            VoicePlayer::WeightedRandom(RandomVoicePlayer::from_regions(rng, regions, pitch))
        }
    };
    log::debug!(
        "pitch {}: {} player over {} regions",
        pitch,
        player.kind(),
        entries.len()
    );
    player
}

/// Distinct seed per (pitch, layer) so cells do not draw in lockstep
fn layer_seed(seed: u64, pitch: i32, layer: usize) -> u64 {
    let cell = (pitch as u64) * NUM_PITCHES as u64 + layer as u64;
    seed.wrapping_add(cell.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_instrument_str;
    use crate::parser::SamplerErrorContext;

    fn build(content: &str) -> PlayerMap {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = SamplerConfig {
            random_seed: Some(1234),
            ..SamplerConfig::default()
        };
        let mut ctx = SamplerErrorContext::new();
        let instrument = load_instrument_str(content, &config, &mut ctx, None).unwrap();
        PlayerMap::build(&instrument, &config)
    }

    fn play(map: &mut PlayerMap, pitch: i32, velocity: i32) -> VoicePlayInfo {
        let mut info = VoicePlayInfo::default();
        map.play(
            &mut info,
            &VoicePlayParameter {
                midi_pitch: pitch,
                midi_velocity: velocity,
            },
        );
        info
    }

    #[test]
    fn test_single_regions() {
        let mut map = build(
            r#"
            <region> sample=low.wav lokey=0 hikey=59 pitch_keycenter=48
            <region> sample=high.wav lokey=60 hikey=127 pitch_keycenter=72
            "#,
        );
        let low = play(&mut map, 48, 100);
        assert!(low.can_play());
        assert_eq!(low.sample_index, 1);
        assert!(!low.needs_transpose);

        let high = play(&mut map, 84, 100);
        assert_eq!(high.sample_index, 2);
        assert!((high.transpose_amt - 2.0).abs() < 1e-5);
        assert_eq!(map.layers(84)[0].player.kind(), "single");
    }

    #[test]
    fn test_drum_key_only() {
        let mut map = build("<region> sample=kick.wav key=36");
        assert!(play(&mut map, 36, 90).can_play());
        assert!(!play(&mut map, 37, 90).valid);
        assert!(map.layers(37).is_empty());
    }

    #[test]
    fn test_velocity_layers() {
        let mut map = build(
            r#"
            <group> key=60
            <region> sample=soft.wav hivel=63
            <region> sample=loud.wav lovel=64
            "#,
        );
        assert_eq!(map.layers(60).len(), 2);
        assert_eq!(play(&mut map, 60, 20).sample_index, 1);
        assert_eq!(play(&mut map, 60, 127).sample_index, 2);
    }

    #[test]
    fn test_round_robin_layer() {
        let mut map = build(
            r#"
            <group> key=38 seq_length=3
            <region> sample=snare3.wav seq_position=3
            <region> sample=snare1.wav seq_position=1
            <region> sample=snare2.wav seq_position=2
            "#,
        );
        assert_eq!(map.layers(38)[0].player.kind(), "round-robin");
        let seen: Vec<usize> = (0..6).map(|_| play(&mut map, 38, 100).sample_index).collect();
        // sample indices follow first use: snare3=1, snare1=2, snare2=3
        assert_eq!(seen, vec![2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn test_random_layer() {
        let mut map = build(
            r#"
            <group> key=42
            <region> sample=hat1.wav hirand=0.5
            <region> sample=hat2.wav lorand=0.5
            "#,
        );
        assert_eq!(map.layers(42)[0].player.kind(), "random");
        let mut counts = [0usize; 3];
        for _ in 0..1000 {
            let info = play(&mut map, 42, 100);
            assert!(info.valid);
            counts[info.sample_index] += 1;
        }
        assert!((400..=600).contains(&counts[1]), "counts: {:?}", counts);
        assert!((400..=600).contains(&counts[2]), "counts: {:?}", counts);
    }

    #[test]
    fn test_random_gap_goes_to_next_range() {
        let mut map = build(
            r#"
            <group> key=42
            <region> sample=a.wav hirand=0.2
            <region> sample=b.wav lorand=0.5
            "#,
        );
        let mut counts = [0usize; 3];
        for _ in 0..1000 {
            let info = play(&mut map, 42, 100);
            assert!(info.valid);
            counts[info.sample_index] += 1;
        }
        assert!((150..=250).contains(&counts[1]), "counts: {:?}", counts);
        assert!((750..=850).contains(&counts[2]), "counts: {:?}", counts);
    }

    #[test]
    fn test_random_layers_draw_independently() {
        let mut map = build(
            r#"
            <group> key=42 hivel=63
            <region> sample=soft1.wav hirand=0.5
            <region> sample=soft2.wav lorand=0.5
            <group> key=42 lovel=64
            <region> sample=loud1.wav hirand=0.5
            <region> sample=loud2.wav lorand=0.5
            "#,
        );
        assert_eq!(map.layers(42).len(), 2);
        // soft samples are 1 and 2, loud samples 3 and 4
        let soft: Vec<usize> = (0..64).map(|_| play(&mut map, 42, 20).sample_index).collect();
        let loud: Vec<usize> = (0..64).map(|_| play(&mut map, 42, 100).sample_index - 2).collect();
        assert!(soft.iter().all(|i| (1..=2).contains(i)));
        assert!(loud.iter().all(|i| (1..=2).contains(i)));
        assert_ne!(soft, loud);
    }

    #[test]
    fn test_layer_seeds_differ() {
        assert_ne!(layer_seed(1234, 42, 0), layer_seed(1234, 42, 1));
        assert_ne!(layer_seed(1234, 42, 1), layer_seed(1234, 43, 0));
    }

    #[test]
    fn test_release_regions_do_not_answer_note_on() {
        let mut map = build("<region> sample=rel.wav key=60 trigger=release");
        assert!(map.layers(60).is_empty());
        assert!(!play(&mut map, 60, 100).valid);

        let mut map = build(
            r#"
            <group> key=60
            <region> sample=att.wav
            <region> sample=rel.wav trigger=release
            "#,
        );
        assert_eq!(map.layers(60)[0].player.kind(), "single");
        for _ in 0..10 {
            let info = play(&mut map, 60, 100);
            assert!(info.can_play());
            assert_eq!(info.sample_index, 1);
        }
    }

    #[test]
    fn test_bad_queries_miss() {
        let mut map = build("<region> sample=a.wav");
        assert!(play(&mut map, 60, 1).valid);
        assert!(!play(&mut map, 60, 0).valid);
        assert!(!play(&mut map, 60, 128).valid);
        assert!(!play(&mut map, -1, 64).valid);
        assert!(!play(&mut map, 128, 64).valid);
    }

    #[test]
    fn test_empty_instrument() {
        let mut map = build("");
        for pitch in [0, 60, 127] {
            assert!(!play(&mut map, pitch, 100).valid);
        }
    }
}
