use super::gazetteer::District;
use crate::core::geo::Coordinate;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Reduces a district label to its lookup key.
///
/// Decomposes to NFD, drops combining marks and whitespace, lower-cases.
/// `đ` has no decomposition and is folded to `d` explicitly.
pub fn canonical_key(label: &str) -> String {
    label
        .nfd()
        .filter(|c| !is_combining_mark(*c) && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'đ' { 'd' } else { c })
        .collect()
}

/// Resolves a district label to its coordinate.
///
/// `None` means the label is not a known district. Callers treat that as
/// "leave the map alone", not as a failure.
pub fn resolve(label: &str) -> Option<Coordinate> {
    match District::from_label(label) {
        Some(district) => Some(district.coordinate()),
        None => {
            log::debug!("no coordinates for district label {:?}", label);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_strips_marks_space_and_case() {
        assert_eq!(canonical_key("Quận Hải Châu"), "quanhaichau");
        assert_eq!(canonical_key("  HẢI   CHÂU "), "haichau");
        assert_eq!(canonical_key("Ngũ Hành Sơn"), "nguhanhson");
        assert_eq!(canonical_key("Đà Nẵng"), "danang");
    }

    #[test]
    fn test_tone_placement_variants_collapse() {
        // Old-style "Hoà" and new-style "Hòa" place the tone differently.
        assert_eq!(canonical_key("Hoà Vang"), canonical_key("Hòa Vang"));
    }

    #[test]
    fn test_resolve_variants_agree() {
        let expected = Some(Coordinate::new(108.2158, 16.0733));
        assert_eq!(resolve("Quận Hải Châu"), expected);
        assert_eq!(resolve("hai chau"), expected);
        assert_eq!(resolve("HẢI CHÂU"), expected);
        assert_eq!(resolve("Hải Châu"), expected);
    }

    #[test]
    fn test_every_district_resolves_in_every_form() {
        for district in District::ALL {
            let bare = resolve(district.name());
            assert!(bare.is_some(), "{district} did not resolve");
            assert_eq!(resolve(&district.full_name()), bare);
            assert_eq!(resolve(&district.name().to_uppercase()), bare);
            assert_eq!(resolve(&canonical_key(district.name())), bare);
        }
    }

    #[test]
    fn test_unknown_label_is_not_found() {
        assert_eq!(resolve("Nonexistent District"), None);
        assert_eq!(resolve(""), None);
    }
}
