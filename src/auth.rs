//! Credential resolution for the providers and the Sonar server.
//!
//! Each credential prefers explicit configuration (CLI/config file/`SQI_*`
//! environment), then the conventional variable for that service. Empty
//! values are ignored. Environment access goes through the supplied lookup
//! so callers decide where values come from.

use crate::cli_args::GlobalArgs;

/// Reads one environment variable, `None` when unset.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// [`EnvLookup`] backed by the process environment.
///
/// Values that are not valid Unicode count as unset.
#[must_use]
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Take `explicit`, else the first non-empty variable among `names`.
fn resolve(explicit: Option<&str>, names: &[&str], env: EnvLookup<'_>) -> Option<String> {
    non_empty(explicit).or_else(|| {
        names
            .iter()
            .find_map(|name| non_empty(env(name).as_deref()))
    })
}

/// GitHub token: `--github-token`, `SQI_GITHUB_TOKEN`, then `GITHUB_TOKEN`.
pub fn resolve_github_token(global: &GlobalArgs, env: EnvLookup<'_>) -> Option<String> {
    resolve(
        global.github_token.as_deref(),
        &["SQI_GITHUB_TOKEN", "GITHUB_TOKEN"],
        env,
    )
}

/// Bitbucket API token, falling back to `BITBUCKET_TOKEN`.
pub fn resolve_bitbucket_token(global: &GlobalArgs, env: EnvLookup<'_>) -> Option<String> {
    resolve(
        global.bitbucket_token.as_deref(),
        &["SQI_BITBUCKET_TOKEN", "BITBUCKET_TOKEN"],
        env,
    )
}

/// Bitbucket account email, falling back to `BITBUCKET_EMAIL`.
pub fn resolve_bitbucket_email(global: &GlobalArgs, env: EnvLookup<'_>) -> Option<String> {
    resolve(
        global.bitbucket_email.as_deref(),
        &["SQI_BITBUCKET_EMAIL", "BITBUCKET_EMAIL"],
        env,
    )
}

/// Sonar token, falling back to `SONAR_TOKEN`.
pub fn resolve_sonar_token(global: &GlobalArgs, env: EnvLookup<'_>) -> Option<String> {
    resolve(
        global.sonar_token.as_deref(),
        &["SQI_SONAR_TOKEN", "SONAR_TOKEN"],
        env,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{EnvGuard, set_var};
    use serial_test::serial;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn resolve_github_token_prefers_global_value() {
        let env = env_of(&[("SQI_GITHUB_TOKEN", "sqi-token"), ("GITHUB_TOKEN", "github-token")]);
        let global = GlobalArgs {
            github_token: Some("cli-token".to_string()),
            ..GlobalArgs::default()
        };

        assert_eq!(resolve_github_token(&global, &env).as_deref(), Some("cli-token"));
    }

    #[test]
    fn resolve_github_token_prefers_sqi_environment() {
        let env = env_of(&[("SQI_GITHUB_TOKEN", "sqi-token"), ("GITHUB_TOKEN", "github-token")]);

        assert_eq!(
            resolve_github_token(&GlobalArgs::default(), &env).as_deref(),
            Some("sqi-token")
        );
    }

    #[test]
    fn resolve_github_token_falls_back_to_github_token_env() {
        let env = env_of(&[("GITHUB_TOKEN", "github-token")]);

        assert_eq!(
            resolve_github_token(&GlobalArgs::default(), &env).as_deref(),
            Some("github-token")
        );
    }

    #[test]
    fn empty_values_are_ignored() {
        let env = env_of(&[("SQI_SONAR_TOKEN", ""), ("SONAR_TOKEN", "squ_env")]);
        let global = GlobalArgs {
            sonar_token: Some(String::new()),
            ..GlobalArgs::default()
        };

        assert_eq!(resolve_sonar_token(&global, &env).as_deref(), Some("squ_env"));
    }

    #[test]
    fn bitbucket_credentials_fall_back_to_conventional_names() {
        let env = env_of(&[("BITBUCKET_TOKEN", "bb-token"), ("BITBUCKET_EMAIL", "dev@example.com")]);
        let global = GlobalArgs::default();

        assert_eq!(resolve_bitbucket_token(&global, &env).as_deref(), Some("bb-token"));
        assert_eq!(
            resolve_bitbucket_email(&global, &env).as_deref(),
            Some("dev@example.com")
        );
    }

    #[test]
    fn missing_everywhere_is_none() {
        let env = env_of(&[]);

        assert!(resolve_sonar_token(&GlobalArgs::default(), &env).is_none());
    }

    #[test]
    #[serial]
    fn process_env_feeds_conventional_fallback() {
        let _guard = EnvGuard::new(&["SQI_SONAR_TOKEN", "SONAR_TOKEN"]);
        assert_eq!(resolve_sonar_token(&GlobalArgs::default(), &process_env), None);

        set_var("SONAR_TOKEN", "squ_process");
        assert_eq!(
            resolve_sonar_token(&GlobalArgs::default(), &process_env).as_deref(),
            Some("squ_process")
        );
    }
}
