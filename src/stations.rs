/// Station identifier handling for the Wimmera gauge network.
///
/// WMIS station identifiers carry a trailing alphabetic revision suffix
/// (e.g. "415247B"). The suffixed form identifies the station in the UI;
/// upstream endpoints address stations by the bare numeric code. This
/// module owns that distinction — all URL construction goes through
/// `numeric_site_id` rather than stripping suffixes ad hoc.

/// Derives the canonical numeric site id by stripping every non-numeric
/// character. Idempotent: applying it to an already-numeric id is a no-op.
pub fn numeric_site_id(station_id: &str) -> String {
    station_id.chars().filter(|c| c.is_ascii_digit()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_is_stripped() {
        assert_eq!(numeric_site_id("415247B"), "415247");
        assert_eq!(numeric_site_id("415200D"), "415200");
    }

    #[test]
    fn test_numeric_id_passes_through_unchanged() {
        assert_eq!(numeric_site_id("415247"), "415247");
    }

    #[test]
    fn test_stripping_is_idempotent() {
        let ids = ["415247B", "415246A", "415256A", "415200D", "415251A"];
        for id in ids {
            let once = numeric_site_id(id);
            assert_eq!(numeric_site_id(&once), once, "stripping '{}' twice changed it", id);
        }
    }

    #[test]
    fn test_only_digits_survive() {
        for c in numeric_site_id("A415-247/B").chars() {
            assert!(c.is_ascii_digit());
        }
        assert_eq!(numeric_site_id("A415-247/B"), "415247");
    }
}
