//! Instrument loading: text to compiled regions.

use crate::config::SamplerConfig;
use crate::parser::path_utils::combine_sample_path;
use crate::parser::{
    compile, parse_tokens, CompiledOpcodes, Error, IncludeHandler, Lexer, Opcode, Result,
    SamplerErrorContext, SfzSection, SfzSectionType,
};
use crate::types::{CompiledRegion, Instrument};
use std::collections::HashMap;

/// Load an instrument from SFZ text.
///
/// Runs the lexer, groups tokens into sections, compiles every section
/// against the opcode schema and builds one [`CompiledRegion`] per
/// `<region>`. Regions inherit from the `<global>`, `<master>` and `<group>`
/// sections above them, and `default_path` from `<control>` is prefixed onto
/// each sample.
///
/// Unknown opcodes and values that do not convert are dropped and recorded in
/// `ctx`. Regions that fail validation are logged and skipped. Lex and parse
/// failures reject the whole text.
///
/// # Arguments
///
/// * `content` - SFZ text
/// * `config` - Include depth limit and diagnostics settings
/// * `ctx` - Collects soft diagnostics; reuse it to dedupe across files
/// * `include_handler` - Resolves `#include "name"` to text, if given
///
/// # Example
///
/// ```
/// use sfz_sampler::{load_instrument_str, SamplerConfig, SamplerErrorContext};
///
/// let mut ctx = SamplerErrorContext::new();
/// let instrument = load_instrument_str(
///     "<control> default_path=piano/ <region> sample=C4.wav key=60",
///     &SamplerConfig::default(),
///     &mut ctx,
///     None,
/// )?;
/// assert_eq!(instrument.num_regions(), 1);
/// assert_eq!(instrument.sample_files(), &["piano/C4.wav".to_string()]);
/// # Ok::<(), sfz_sampler::Error>(())
/// ```
pub fn load_instrument_str(
    content: &str,
    config: &SamplerConfig,
    ctx: &mut SamplerErrorContext,
    include_handler: Option<IncludeHandler>,
) -> Result<Instrument> {
    config.validate()?;

    let lexer = match include_handler {
        Some(handler) => Lexer::with_include_handler(handler),
        None => Lexer::new(),
    };
    let tokens = lexer
        .max_include_depth(config.max_include_depth)
        .lex(content)?;
    let sections = parse_tokens(&tokens)?;

    log::debug!("{} tokens in {} sections", tokens.len(), sections.len());

    let instrument = build_instrument(&sections, ctx);

    log::info!("Loaded {}", instrument.info());
    if !ctx.is_empty() {
        log::info!("Diagnostics: {}", ctx.summary());
    }

    Ok(instrument)
}

/// Build an instrument from already grouped sections.
pub fn build_instrument(sections: &[SfzSection], ctx: &mut SamplerErrorContext) -> Instrument {
    let mut instrument = Instrument::default();
    let mut sample_cache: HashMap<String, usize> = HashMap::new();

    let mut default_path = String::new();
    let mut global = CompiledOpcodes::new();
    let mut master = CompiledOpcodes::new();
    let mut group = CompiledOpcodes::new();

    for section in sections {
        match section.section_type {
            SfzSectionType::Control => {
                let control = compile(ctx, &section.pairs);
                if let Some(path) = control.get_str(Opcode::DefaultPath) {
                    default_path = path.to_string();
                }
            }
            SfzSectionType::Global => global = compile(ctx, &section.pairs),
            SfzSectionType::Master => {
                master = compile(ctx, &section.pairs);
                group = CompiledOpcodes::new();
            }
            SfzSectionType::Group => group = compile(ctx, &section.pairs),
            SfzSectionType::Region => {
                let mut opcodes = global.clone();
                opcodes.merge(&master);
                opcodes.merge(&group);
                opcodes.merge(&compile(ctx, &section.pairs));

                match load_region(&opcodes, section.line, &default_path) {
                    Ok(region) => {
                        let sample_index =
                            sample_index_for(&mut instrument, &mut sample_cache, &region);
                        instrument.regions.push(region);
                        instrument.sample_indices.push(sample_index);
                    }
                    Err(e) => {
                        log::warn!("Failed to load region: {}", e);
                        // Continue loading other regions
                    }
                }
            }
            SfzSectionType::Curve | SfzSectionType::Effect => {
                log::debug!(
                    "ignoring {} section at line {}",
                    section.section_type.header_str(),
                    section.line + 1
                );
            }
        }
    }

    instrument
}

/// Build a single region from its inherited opcodes.
fn load_region(
    opcodes: &CompiledOpcodes,
    line: usize,
    default_path: &str,
) -> Result<CompiledRegion> {
    let mut region = CompiledRegion::from_opcodes(opcodes, line)?;
    if region.sample_file.is_empty() {
        return Err(Error::InvalidRegion {
            message: "no sample defined in region".to_string(),
            line: line + 1,
        });
    }
    region.sample_file = combine_sample_path(default_path, &region.sample_file);
    Ok(region)
}

/// Index of the region's sample, adding it on first use
fn sample_index_for(
    instrument: &mut Instrument,
    sample_cache: &mut HashMap<String, usize>,
    region: &CompiledRegion,
) -> usize {
    if let Some(&index) = sample_cache.get(&region.sample_file) {
        log::debug!("Reusing sample {} for {}", index, region.sample_file);
        return index;
    }
    instrument.sample_files.push(region.sample_file.clone());
    let index = instrument.sample_files.len();
    log::debug!("New sample {}: {}", index, region.sample_file);
    sample_cache.insert(region.sample_file.clone(), index);
    index
}
