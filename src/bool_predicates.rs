//! Serde predicate for boolean CLI flags.

/// Returns `true` when `flag` is unset.
///
/// Used in `skip_serializing_if` so an absent `--sonar-public` flag does not
/// serialise as `false` and mask a value from a file or the environment
/// during configuration merging.
///
/// # Examples
///
/// ```
/// use sqi::bool_predicates::not;
///
/// assert!(not(&false));
/// assert!(!not(&true));
/// ```
#[must_use]
pub fn not(flag: &bool) -> bool {
    !*flag
}
