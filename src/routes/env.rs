//! `$VAR` indirection for configuration values.
//!
//! Any string value beginning with `$` names an environment variable; the
//! variable's value (or the empty string, when it is unset or not unicode)
//! replaces it. This keeps secrets such as Matrix passwords out of the
//! configuration file.

const SIGIL: char = '$';

/// Resolves a configuration value against the process environment.
pub fn resolve_env_sigil(value: &str) -> String {
    resolve_env_sigil_with(value, |name| std::env::var(name).ok())
}

/// Resolves a configuration value against an arbitrary variable lookup.
pub fn resolve_env_sigil_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match value.strip_prefix(SIGIL) {
        Some(name) => lookup(name).unwrap_or_default(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &HashMap<String, String>) -> impl Fn(&str) -> Option<String> + '_ {
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn substitutes_set_variable() {
        let vars = HashMap::from([("MATRIX_PASSWORD".to_string(), "hunter2".to_string())]);
        assert_eq!(
            resolve_env_sigil_with("$MATRIX_PASSWORD", lookup_in(&vars)),
            "hunter2"
        );
    }

    #[test]
    fn unset_variable_is_empty() {
        assert_eq!(resolve_env_sigil_with("$NOPE", |_| None), "");
    }

    #[test]
    fn only_leading_sigil_counts() {
        assert_eq!(resolve_env_sigil_with("pa$$word", |_| None), "pa$$word");
        assert_eq!(
            resolve_env_sigil_with("$$X", |name| Some(format!("<{}>", name))),
            "<$X>"
        );
    }

    #[test]
    fn bare_sigil_looks_up_empty_name() {
        assert_eq!(resolve_env_sigil_with("$", |name| Some(name.to_string())), "");
    }

    #[test]
    fn reads_process_environment() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(resolve_env_sigil("$PATH"), path);
    }

    proptest! {
        #[test]
        fn sigil_values_resolve_to_variable(
            name in "[A-Z_][A-Z0-9_]{0,20}",
            value in "[ -~]{0,40}",
            set in any::<bool>()
        ) {
            let mut vars = HashMap::new();
            if set {
                vars.insert(name.clone(), value.clone());
            }
            let expected = if set { value } else { String::new() };
            prop_assert_eq!(resolve_env_sigil_with(&format!("${}", name), lookup_in(&vars)), expected);
        }

        #[test]
        fn plain_values_pass_through(value in "[^$][ -~]{0,40}") {
            prop_assert_eq!(resolve_env_sigil_with(&value, |_| Some("x".into())), value);
        }
    }
}
