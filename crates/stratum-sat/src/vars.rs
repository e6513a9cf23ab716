//! Auxiliary variable naming for enum and version encodings.
//!
//! Naming conventions:
//! - `<feature>` — presence variable of a boolean/versioned feature
//! - `<feature>=<value>` — one-hot variable for an enum value
//! - `<feature>@<k>` — installed at exactly version k
//! - `<feature>>=<k>` / `<feature><=<k>` — installed at-or-above / at-or-below k
//! - `<feature>!>=<k>` / `<feature>!<=<k>` — their negative duals
//!
//! The marker characters `=`, `@`, `>`, `<`, `!` cannot occur in fully
//! qualified feature names (the rule language's lexer rejects them), which
//! keeps auxiliary names distinct from every presence variable and the two
//! encoding kinds distinct from each other. Characters that do occur in
//! names and values but would be ambiguous inside an auxiliary name
//! (including whitespace and the markers themselves, should a value contain
//! one) are percent-escaped, making every naming function injective over its
//! domain.

/// Characters with a reserved meaning inside auxiliary variable names.
const MARKERS: &[char] = &['%', '=', '@', '>', '<', '!'];

/// Percent-escape marker characters and whitespace.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if MARKERS.contains(&c) || c.is_whitespace() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02x}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// One-hot variable for `feature` taking `value`.
pub fn enum_var(feature: &str, value: &str) -> String {
    format!("{}={}", escape(feature), escape(value))
}

/// "Installed at exactly version `k`" variable.
pub fn exact_version_var(feature: &str, k: u32) -> String {
    format!("{}@{k}", escape(feature))
}

/// "Installed at version `k` or above" ladder variable.
pub fn at_least_version_var(feature: &str, k: u32) -> String {
    format!("{}>={k}", escape(feature))
}

/// "Installed at version `k` or below" ladder variable.
pub fn at_most_version_var(feature: &str, k: u32) -> String {
    format!("{}<={k}", escape(feature))
}

/// Negative dual of [`at_least_version_var`].
pub fn not_at_least_version_var(feature: &str, k: u32) -> String {
    format!("{}!>={k}", escape(feature))
}

/// Negative dual of [`at_most_version_var`].
pub fn not_at_most_version_var(feature: &str, k: u32) -> String {
    format!("{}!<={k}", escape(feature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn escape_is_injective_on_tricky_inputs() {
        let inputs = ["a b", "a%20b", "a=b", "a%3db", "a", "a%", "a%25"];
        let escaped: HashSet<String> = inputs.iter().map(|s| escape(s)).collect();
        assert_eq!(escaped.len(), inputs.len());
    }

    #[test]
    fn escape_keeps_module_separators_readable() {
        assert_eq!(escape("billing.checkout"), "billing.checkout");
        assert_eq!(escape("a b"), "a%20b");
        assert_eq!(escape("x=y"), "x%3dy");
    }

    #[test]
    fn families_never_collide() {
        let names = [
            enum_var("f", "1"),
            exact_version_var("f", 1),
            at_least_version_var("f", 1),
            at_most_version_var("f", 1),
            not_at_least_version_var("f", 1),
            not_at_most_version_var("f", 1),
            "f".to_string(),
        ];
        let distinct: HashSet<&String> = names.iter().collect();
        assert_eq!(distinct.len(), names.len());
    }

    #[test]
    fn value_boundaries_are_unambiguous() {
        // A value containing a marker must not collide with another
        // (feature, value) pair that reads the same unescaped.
        assert_ne!(enum_var("f", "a=b"), enum_var("f=a", "b"));
        assert_ne!(enum_var("mod.f", "v 1"), enum_var("mod.f", "v_1"));
    }

    #[test]
    fn names_are_stable() {
        assert_eq!(enum_var("color", "red"), "color=red");
        assert_eq!(exact_version_var("core.v", 3), "core.v@3");
        assert_eq!(at_least_version_var("core.v", 3), "core.v>=3");
        assert_eq!(at_most_version_var("core.v", 3), "core.v<=3");
        assert_eq!(not_at_least_version_var("core.v", 3), "core.v!>=3");
        assert_eq!(not_at_most_version_var("core.v", 3), "core.v!<=3");
    }
}
