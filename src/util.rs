use std::iter::repeat;
use std::path::{Path, PathBuf};

use base64::engine::{DecodePaddingMode, GeneralPurpose};

pub fn find_first_subpath<P: AsRef<Path>, F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    subpaths: &[P],
    search: F,
) -> Option<PathBuf> {
    subpaths
        .iter()
        .zip(repeat(root.as_ref()))
        .map(|(b, a)| a.join(b))
        .find(|it: &PathBuf| search(it))
}

/// URL safe engine that accepts both padded and unpadded input, as JWT
/// segments are never padded.
pub fn base64_engine() -> GeneralPurpose {
    base64::engine::GeneralPurpose::new(
        &base64::alphabet::URL_SAFE,
        base64::engine::GeneralPurposeConfig::new()
            .with_encode_padding(false)
            .with_decode_padding_mode(DecodePaddingMode::Indifferent),
    )
}

/// Splits a comma separated list, trimming entries and skipping blanks.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|it| !it.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_skips_blank_entries() {
        assert_eq!(
            split_list(" a1, ,b2 ,,c3"),
            vec!["a1".to_string(), "b2".to_string(), "c3".to_string()]
        );
        assert!(split_list("  ").is_empty());
    }
}
