//! Sample reference helpers
//!
//! Sample references are kept as text: nothing here touches the file system.
//! Backslashes, common in SFZ files written on Windows, are normalised to `/`.

/// Normalise path separators to `/`
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// True for `/abs/path` and `C:/path` style references
pub fn is_absolute_reference(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || (bytes.len() >= 3
            && bytes[0].is_ascii_alphabetic()
            && bytes[1] == b':'
            && (bytes[2] == b'/' || bytes[2] == b'\\'))
}

/// Combine a `default_path` with a region's `sample`
///
/// Absolute sample references are returned as they are (normalised).
///
/// ```
/// use sfz_sampler::parser::path_utils::combine_sample_path;
///
/// assert_eq!(combine_sample_path("samples\\piano", "C4.wav"), "samples/piano/C4.wav");
/// assert_eq!(combine_sample_path("samples/", "/abs/C4.wav"), "/abs/C4.wav");
/// ```
pub fn combine_sample_path(default_path: &str, sample_path: &str) -> String {
    let sample = normalize_path(sample_path);
    if is_absolute_reference(&sample) {
        return sample;
    }

    let mut combined = normalize_path(default_path);
    if !combined.is_empty() && !combined.ends_with('/') {
        combined.push('/');
    }
    combined.push_str(&sample);
    combined
}
