// Author: Dustin Pilgrim
// License: MIT

use regex::Regex;

use crate::core::config::Pattern;

const REGEX_META: [char; 14] = ['.', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '\\', '^', '$'];

/// Parse a text-entry target, detecting whether it's a regex or a literal.
/// Literals are lowercased; regexes match case-insensitively.
pub fn parse_target_pattern(s: &str) -> Result<Pattern, String> {
    if s.chars().any(|c| REGEX_META.contains(&c)) {
        compile_regex(s)
    } else {
        Ok(Pattern::Literal(s.trim().to_lowercase()))
    }
}

pub fn compile_regex(s: &str) -> Result<Pattern, String> {
    Regex::new(&format!("(?i){}", s))
        .map(Pattern::Regex)
        .map_err(|e| format!("invalid regex '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_literals() {
        match parse_target_pattern("Password").unwrap() {
            Pattern::Literal(s) => assert_eq!(s, "password"),
            other => panic!("expected literal, got {other}"),
        }
    }

    #[test]
    fn meta_characters_make_a_regex() {
        let p = parse_target_pattern("^input#(email|user)").unwrap();
        assert!(p.matches_lc("input#email"));
        assert!(!p.matches_lc("div#email"));
        assert!(parse_target_pattern("input(").is_err());
    }
}
