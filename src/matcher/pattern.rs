//! Pattern matching implementation.

use std::str::FromStr;

use crate::crypto::Address;

/// Decides whether a derived address is the one being searched for.
pub trait MatchPredicate: Sync {
    fn is_match(&self, address: &Address) -> bool;
}

impl<F> MatchPredicate for F
where
    F: Fn(&Address) -> bool + Sync,
{
    #[inline]
    fn is_match(&self, address: &Address) -> bool {
        self(address)
    }
}

/// The type of pattern matching to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternType {
    /// Match at the beginning of the address
    #[default]
    Prefix,
    /// Match at the end of the address
    Suffix,
    /// Match anywhere in the address
    Contains,
    /// Match both prefix and suffix
    PrefixAndSuffix,
    /// Match the whole address
    Exact,
}

impl FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prefix" | "start" | "begin" => Ok(PatternType::Prefix),
            "suffix" | "end" => Ok(PatternType::Suffix),
            "contains" | "anywhere" | "any" => Ok(PatternType::Contains),
            "prefixandsuffix" | "both" => Ok(PatternType::PrefixAndSuffix),
            "exact" | "full" => Ok(PatternType::Exact),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternType::Prefix => write!(f, "prefix"),
            PatternType::Suffix => write!(f, "suffix"),
            PatternType::Contains => write!(f, "contains"),
            PatternType::PrefixAndSuffix => write!(f, "prefix+suffix"),
            PatternType::Exact => write!(f, "exact"),
        }
    }
}

/// A normalized (lowercase, no `0x`) hex pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// The pattern string (normalized)
    pattern: String,
    /// Optional suffix pattern for PrefixAndSuffix mode
    suffix: Option<String>,
    pattern_type: PatternType,
    /// Nibble values of `pattern` and `suffix`, compared on the hot path.
    nibbles: Vec<u8>,
    suffix_nibbles: Vec<u8>,
}

/// Marks a non-hex pattern character; never equal to an address nibble.
const NO_NIBBLE: u8 = 0xff;

fn to_nibbles(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| c.to_digit(16).map_or(NO_NIBBLE, |d| d as u8))
        .collect()
}

/// The 40 hex digits of `address`, one nibble per element.
#[inline]
fn address_nibbles(address: &Address) -> [u8; 40] {
    let mut out = [0u8; 40];
    for (i, byte) in address.as_bytes().iter().enumerate() {
        out[2 * i] = byte >> 4;
        out[2 * i + 1] = byte & 0x0f;
    }
    out
}

fn normalize(s: String) -> String {
    let lower = s.to_lowercase();
    match lower.strip_prefix("0x") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

impl Pattern {
    /// Creates a new pattern.
    pub fn new(pattern: impl Into<String>, pattern_type: PatternType) -> Self {
        let pattern = normalize(pattern.into());
        Self {
            nibbles: to_nibbles(&pattern),
            suffix_nibbles: Vec::new(),
            pattern,
            suffix: None,
            pattern_type,
        }
    }

    /// Creates a new prefix+suffix pattern.
    pub fn new_prefix_and_suffix(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        let pattern = normalize(prefix.into());
        let suffix = normalize(suffix.into());
        Self {
            nibbles: to_nibbles(&pattern),
            suffix_nibbles: to_nibbles(&suffix),
            pattern,
            suffix: Some(suffix),
            pattern_type: PatternType::PrefixAndSuffix,
        }
    }

    /// Matches exactly one address.
    pub fn exact(address: &Address) -> Self {
        Self::new(address.to_hex(), PatternType::Exact)
    }

    /// Returns the pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the suffix pattern, if any.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Returns the pattern type.
    pub fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Matches an address against this pattern.
    #[inline]
    pub fn matches(&self, address: &Address) -> bool {
        let digits = address_nibbles(address);
        let pattern = self.nibbles.as_slice();

        match self.pattern_type {
            PatternType::Prefix => digits.starts_with(pattern),
            PatternType::Suffix => digits.ends_with(pattern),
            PatternType::Contains => {
                pattern.is_empty() || digits.windows(pattern.len()).any(|w| w == pattern)
            }
            PatternType::PrefixAndSuffix => {
                digits.starts_with(pattern) && digits.ends_with(&self.suffix_nibbles)
            }
            PatternType::Exact => digits.as_slice() == pattern,
        }
    }

    /// Returns the estimated difficulty (number of attempts to find a match).
    ///
    /// For hex patterns:
    /// - Each character has 16 possible values
    /// - Expected attempts = 16^n where n is pattern length
    pub fn estimated_difficulty(&self) -> u64 {
        let total_len = self.pattern.len() + self.suffix.as_ref().map_or(0, |s| s.len());
        16u64.saturating_pow(total_len as u32)
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let diff = self.estimated_difficulty();
        match diff {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl MatchPredicate for Pattern {
    #[inline]
    fn is_match(&self, address: &Address) -> bool {
        self.matches(address)
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{} ... {} ({})", self.pattern, suffix, self.pattern_type),
            None => write!(f, "{} ({})", self.pattern, self.pattern_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_address(hex_str: &str) -> Address {
        Address::from_hex(hex_str).unwrap()
    }

    #[test]
    fn test_prefix_match() {
        let pattern = Pattern::new("dead", PatternType::Prefix);
        let addr = make_address("deadbeef00000000000000000000000000000000");
        assert!(pattern.matches(&addr));
    }

    #[test]
    fn test_prefix_no_match() {
        let pattern = Pattern::new("dead", PatternType::Prefix);
        let addr = make_address("beefdeadbeef0000000000000000000000000000");
        assert!(!pattern.matches(&addr));
    }

    #[test]
    fn test_suffix_match_ignores_case() {
        let pattern = Pattern::new("BADC0DE", PatternType::Suffix);
        let addr = make_address("000000000000000000000000000000000badc0de");
        assert!(pattern.matches(&addr));
    }

    #[test]
    fn test_contains_match() {
        let pattern = Pattern::new("cafe", PatternType::Contains);
        // 20 bytes = 40 hex chars: 18 zeros + cafe + 18 zeros = 36 + 4 = 40
        let addr = make_address("000000000000000000cafe000000000000000000");
        assert!(pattern.matches(&addr));
    }

    #[test]
    fn test_prefix_and_suffix() {
        let pattern = Pattern::new_prefix_and_suffix("dead", "beef");
        assert!(pattern.matches(&make_address("dead00000000000000000000000000000000beef")));
        assert!(!pattern.matches(&make_address("dead00000000000000000000000000000000bee0")));
    }

    #[test]
    fn test_exact() {
        let addr = make_address("970e8128ab834e8eac17ab8e3812f010678cf791");
        let pattern = Pattern::exact(&addr);
        assert!(pattern.is_match(&addr));
        assert!(!pattern.is_match(&Address::default()));
        let prefixed = Pattern::new("0x970E8128AB834E8EAC17AB8E3812F010678CF791", PatternType::Exact);
        assert!(prefixed.is_match(&addr));
    }

    #[test]
    fn test_closure_predicate() {
        let predicate = |a: &Address| a.as_bytes()[19] == 0xde;
        assert!(predicate.is_match(&make_address("00000000000000000000000000000000000000de")));
    }

    #[test]
    fn test_matches_agree_with_hex_text() {
        let addr = make_address("970e8128ab834e8eac17ab8e3812f010678cf791");
        let hex = addr.to_hex();
        for (text, pattern_type) in [
            ("970e", PatternType::Prefix),
            ("970f", PatternType::Prefix),
            ("8cf791", PatternType::Suffix),
            ("8cf790", PatternType::Suffix),
            ("ab834e", PatternType::Contains),
            ("e812f0", PatternType::Contains),
            ("ab834f", PatternType::Contains),
        ] {
            let expected = match pattern_type {
                PatternType::Prefix => hex.starts_with(text),
                PatternType::Suffix => hex.ends_with(text),
                _ => hex.contains(text),
            };
            assert_eq!(
                Pattern::new(text, pattern_type).matches(&addr),
                expected,
                "{text} ({pattern_type})"
            );
        }
    }

    #[test]
    fn test_odd_length_and_non_hex_patterns() {
        let addr = make_address("abc0000000000000000000000000000000000def");
        assert!(Pattern::new("abc", PatternType::Prefix).matches(&addr));
        assert!(Pattern::new("0def", PatternType::Suffix).matches(&addr));
        assert!(!Pattern::new("abg", PatternType::Prefix).matches(&addr));
        assert!(!Pattern::new(&"0".repeat(41), PatternType::Contains).matches(&addr));
    }

    #[test]
    fn test_difficulty() {
        let pattern = Pattern::new("dead", PatternType::Prefix);
        assert_eq!(pattern.estimated_difficulty(), 65536); // 16^4
    }
}
