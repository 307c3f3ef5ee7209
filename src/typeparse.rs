//! Canonical type-spelling decoder.
//!
//! The front-end hands us fully resolved, alias-free C++ type spellings
//! ("canonical spellings"): `std::optional<std::vector<std::string>>`,
//! `std::map<std::string, std::uint64_t, std::less<>>`, and so on. This
//! module turns a spelling into a [`TypeDescriptor`] by recursive descent:
//!
//! 1. exact-match lookup in the scalar catalogue (checked first so the
//!    round-trip is stable),
//! 2. exact-match lookup for the comparator relations (`<>`/`<void>` forms),
//! 3. otherwise split at the outermost `<…>` pair and dispatch on the head,
//!    splitting argument lists on top-level commas only (commas nested in
//!    further angle brackets never split),
//! 4. bare spellings under the `couchbase::` scope become `Named`,
//! 5. anything else degrades to `Unknown` with a diagnostic; decoding never
//!    fails hard.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::diag;
use crate::typedesc::{Relation, Scalar, TypeDescriptor};

/// Scope prefix that marks a spelling as one of our own extracted types.
pub const SCOPE_PREFIX: &str = "couchbase::";

// ------------------------------ Catalogues -------------------------------- //

static SCALARS: Lazy<HashMap<&'static str, Scalar>> = Lazy::new(|| {
    HashMap::from([
        ("std::mutex", Scalar::Mutex),
        ("std::string", Scalar::String),
        ("std::error_code", Scalar::ErrorCode),
        ("std::monostate", Scalar::Monostate),
        ("std::byte", Scalar::Byte),
        ("std::nullptr_t", Scalar::NullPtr),
        // integer spellings come out of the front-end fully canonicalized
        ("unsigned long", Scalar::Size),
        ("char", Scalar::I8),
        ("unsigned char", Scalar::U8),
        ("short", Scalar::I16),
        ("unsigned short", Scalar::U16),
        ("int", Scalar::I32),
        ("unsigned int", Scalar::U32),
        ("long long", Scalar::I64),
        ("unsigned long long", Scalar::U64),
        ("bool", Scalar::Bool),
        ("float", Scalar::F32),
        ("double", Scalar::F64),
        // std::chrono durations canonicalize to their ratio form
        ("std::chrono::duration<long long>", Scalar::Seconds),
        (
            "std::chrono::duration<long long, std::ratio<1, 1000>>",
            Scalar::Millis,
        ),
        (
            "std::chrono::duration<long long, std::ratio<1, 1000000>>",
            Scalar::Micros,
        ),
        (
            "std::chrono::duration<long long, std::ratio<1, 1000000000>>",
            Scalar::Nanos,
        ),
    ])
});

// (relation, typed): the `<void>` specialization counts as typed, the
// diamond form as untyped. Both serialize identically.
static COMPARATORS: Lazy<HashMap<&'static str, (Relation, bool)>> = Lazy::new(|| {
    HashMap::from([
        ("std::less<>", (Relation::Less, false)),
        ("std::less<void>", (Relation::Less, true)),
        ("std::greater<>", (Relation::Greater, false)),
        ("std::greater<void>", (Relation::Greater, true)),
        ("std::less_equal<>", (Relation::LessEqual, false)),
        ("std::less_equal<void>", (Relation::LessEqual, true)),
        ("std::greater_equal<>", (Relation::GreaterEqual, false)),
        ("std::greater_equal<void>", (Relation::GreaterEqual, true)),
    ])
});

// ------------------------------- Decoder ---------------------------------- //

/// Decode one canonical spelling. Total: malformed input yields
/// `Unknown(spelling)` plus a diagnostic, never an error.
pub fn parse_type(spelling: &str) -> TypeDescriptor {
    let spelling = spelling.trim();

    if let Some(sc) = SCALARS.get(spelling) {
        return TypeDescriptor::Scalar(*sc);
    }
    if let Some((relation, typed)) = COMPARATORS.get(spelling) {
        return TypeDescriptor::Comparator {
            relation: *relation,
            typed: *typed,
        };
    }

    if let Some((head, args)) = split_generic(spelling) {
        match head {
            "std::function" => return TypeDescriptor::Callable,
            "std::optional" => return TypeDescriptor::Optional(Box::new(parse_type(args))),
            "std::vector" => return TypeDescriptor::Sequence(Box::new(parse_type(args))),
            "std::set" => return TypeDescriptor::Set(Box::new(parse_type(args))),
            "std::shared_ptr" => return TypeDescriptor::SharedRef(Box::new(parse_type(args))),
            "std::variant" => {
                let alts = split_top_level(args);
                if alts.is_empty() {
                    return unknown(spelling, "variant with no alternatives");
                }
                return TypeDescriptor::Union(alts.into_iter().map(parse_type).collect());
            }
            "std::array" => {
                let parts = split_top_level(args);
                if parts.len() != 2 {
                    return unknown(spelling, "array wants exactly 2 arguments");
                }
                let Ok(size) = parts[1].parse::<u64>() else {
                    return unknown(spelling, "array size is not an integer");
                };
                return TypeDescriptor::FixedArray {
                    elem: Box::new(parse_type(parts[0])),
                    size,
                };
            }
            "std::map" => {
                let parts = split_top_level(args);
                if parts.len() < 2 || parts.len() > 3 {
                    return unknown(spelling, "map wants 2 or 3 arguments");
                }
                return TypeDescriptor::OrderedMap {
                    key: Box::new(parse_type(parts[0])),
                    value: Box::new(parse_type(parts[1])),
                    comparator: parts.get(2).map(|c| Box::new(parse_type(c))),
                };
            }
            _ => {} // unrecognized generic head; fall through to the prefix check
        }
    }

    if !spelling.starts_with(SCOPE_PREFIX) {
        return unknown(spelling, "no matching grammar rule");
    }

    if spelling.contains("unnamed struct") {
        // the walker normally substitutes a synthesized name before we get here
        diag::warn(format!("found unnamed struct spelling: {spelling}"));
    }

    TypeDescriptor::Named(spelling.to_string())
}

fn unknown(spelling: &str, why: &str) -> TypeDescriptor {
    diag::warn(format!("failed to decode type spelling ({why}): {spelling}"));
    TypeDescriptor::Unknown(spelling.to_string())
}

// ------------------------------ Splitting --------------------------------- //

/// Split `head<args>` at the first `<` and its matching trailing `>`.
/// Returns `None` when there is no bracketed argument list.
fn split_generic(spelling: &str) -> Option<(&str, &str)> {
    let open = spelling.find('<')?;
    if !spelling.ends_with('>') {
        return None;
    }
    Some((&spelling[..open], &spelling[open + 1..spelling.len() - 1]))
}

/// Split an argument list on commas at angle-bracket depth 0 only.
/// `map<int, string>, bool` → `["map<int, string>", "bool"]`.
fn split_top_level(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in args.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = args[start..].trim();
    if !tail.is_empty() || !parts.is_empty() {
        parts.push(tail);
    }
    parts
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedesc::{Relation, Scalar, TypeDescriptor as T};

    #[test]
    fn scalar_catalogue_is_stable() {
        for (spelling, scalar) in [
            ("int", Scalar::I32),
            ("unsigned long long", Scalar::U64),
            ("bool", Scalar::Bool),
            ("std::string", Scalar::String),
            ("std::error_code", Scalar::ErrorCode),
            ("std::chrono::duration<long long, std::ratio<1, 1000>>", Scalar::Millis),
        ] {
            assert_eq!(parse_type(spelling), T::Scalar(scalar), "{spelling}");
            // same spelling, same descriptor, every time
            assert_eq!(parse_type(spelling), parse_type(spelling));
        }
    }

    #[test]
    fn nested_generics_are_depth_correct() {
        let ty = parse_type("std::optional<std::vector<int>>");
        assert_eq!(
            ty,
            T::Optional(Box::new(T::Sequence(Box::new(T::Scalar(Scalar::I32)))))
        );
    }

    #[test]
    fn union_split_respects_bracket_nesting() {
        let ty = parse_type("std::variant<std::map<int, std::string>, bool>");
        let T::Union(alts) = ty else { panic!("expected union") };
        assert_eq!(alts.len(), 2);
        assert!(matches!(alts[0], T::OrderedMap { .. }));
        assert_eq!(alts[1], T::Scalar(Scalar::Bool));
    }

    #[test]
    fn union_requires_an_alternative() {
        assert!(matches!(parse_type("std::variant<>"), T::Unknown(_)));
    }

    #[test]
    fn array_argument_count_violations_degrade() {
        assert!(matches!(parse_type("std::array<int>"), T::Unknown(_)));
        assert!(matches!(
            parse_type("std::array<int, 3, 4>"),
            T::Unknown(_)
        ));
        assert!(matches!(
            parse_type("std::array<int, banana>"),
            T::Unknown(_)
        ));
        assert_eq!(
            parse_type("std::array<unsigned char, 16>"),
            T::FixedArray {
                elem: Box::new(T::Scalar(Scalar::U8)),
                size: 16
            }
        );
    }

    #[test]
    fn map_argument_count_violations_degrade() {
        assert!(matches!(parse_type("std::map<int>"), T::Unknown(_)));
        assert!(matches!(
            parse_type("std::map<int, int, std::less<>, int>"),
            T::Unknown(_)
        ));
    }

    #[test]
    fn map_comparator_forms() {
        let two = parse_type("std::map<std::string, std::string>");
        let T::OrderedMap { comparator, .. } = two else { panic!() };
        assert!(comparator.is_none());

        let three = parse_type("std::map<std::string, std::string, std::less<void>>");
        let T::OrderedMap { comparator, .. } = three else { panic!() };
        assert_eq!(
            *comparator.unwrap(),
            T::Comparator {
                relation: Relation::Less,
                typed: true
            }
        );
    }

    #[test]
    fn comparator_catalogue_both_forms() {
        assert_eq!(
            parse_type("std::greater<>"),
            T::Comparator {
                relation: Relation::Greater,
                typed: false
            }
        );
        assert_eq!(
            parse_type("std::greater_equal<void>"),
            T::Comparator {
                relation: Relation::GreaterEqual,
                typed: true
            }
        );
    }

    #[test]
    fn callable_ignores_its_arguments() {
        assert_eq!(
            parse_type("std::function<void (std::error_code)>"),
            T::Callable
        );
    }

    #[test]
    fn scoped_spellings_become_named() {
        assert_eq!(
            parse_type("couchbase::core::document_id"),
            T::Named("couchbase::core::document_id".into())
        );
    }

    #[test]
    fn unscoped_spellings_become_unknown() {
        assert!(matches!(parse_type("some::other::thing"), T::Unknown(_)));
        assert!(matches!(parse_type("std::deque<int>"), T::Unknown(_)));
    }

    #[test]
    fn deeply_nested_combination_terminates() {
        let ty = parse_type(
            "std::map<std::string, std::variant<std::vector<std::optional<int>>, \
             std::array<std::byte, 8>>, std::less<>>",
        );
        let T::OrderedMap { value, .. } = ty else { panic!() };
        let T::Union(alts) = *value else { panic!() };
        assert_eq!(alts.len(), 2);
    }
}
