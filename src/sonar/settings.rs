//! Validated code-quality service settings.

use url::Url;

use super::url::normalize_endpoint;
use crate::SqiError;
use crate::models::{IssuesQuery, ResolvedTarget, SonarMode};

/// Public multi-tenant service used when no endpoint is configured.
pub const SONARCLOUD_URL: &str = "https://sonarcloud.io";

/// Time zone sent to self-hosted instances unless configured otherwise.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Raw, possibly incomplete service settings as collected from configuration.
#[derive(Debug, Clone, Default)]
pub struct SonarOptions {
    pub url: Option<String>,
    pub token: Option<String>,
    pub public: bool,
    pub organization: Option<String>,
    pub project_key: Option<String>,
    pub timezone: Option<String>,
}

/// Settings every issues query is built from.
#[derive(Debug, Clone)]
pub struct SonarSettings {
    endpoint: Url,
    mode: SonarMode,
    component_key: String,
    organization: Option<String>,
    token: Option<String>,
    timezone: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl SonarSettings {
    /// Derive the service mode and validate the identifiers it requires.
    ///
    /// Public mode needs the `public` flag, an organization and a component
    /// key; private mode needs a project key and a token.
    ///
    /// # Errors
    ///
    /// Returns [`SqiError::Configuration`] naming the first missing or
    /// invalid setting.
    pub fn from_options(options: SonarOptions) -> Result<Self, SqiError> {
        let organization = non_empty(options.organization);
        let component_key = non_empty(options.project_key)
            .ok_or_else(|| SqiError::configuration("a Sonar project key is required (--sonar-project-key)"))?;
        let token = non_empty(options.token);
        let mode = if options.public {
            if organization.is_none() {
                return Err(SqiError::configuration(
                    "public Sonar mode requires an organization (--sonar-organization)",
                ));
            }
            SonarMode::PublicMultiTenant
        } else {
            if token.is_none() {
                return Err(SqiError::configuration(
                    "a Sonar token is required for a self-hosted instance (--sonar-token or SONAR_TOKEN)",
                ));
            }
            SonarMode::PrivateSelfHosted
        };
        let raw_url = non_empty(options.url);
        let endpoint = match (&raw_url, mode) {
            (Some(url), _) => normalize_endpoint(url)?,
            (None, SonarMode::PublicMultiTenant) => normalize_endpoint(SONARCLOUD_URL)?,
            (None, SonarMode::PrivateSelfHosted) => {
                return Err(SqiError::configuration(
                    "a Sonar URL is required for a self-hosted instance (--sonar-url)",
                ));
            }
        };
        Ok(Self {
            endpoint,
            mode,
            component_key,
            organization,
            token,
            timezone: non_empty(options.timezone).unwrap_or_else(|| DEFAULT_TIMEZONE.to_owned()),
        })
    }

    #[must_use]
    pub fn mode(&self) -> SonarMode {
        self.mode
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Assemble the query for `target`.
    ///
    /// # Errors
    ///
    /// Propagates [`IssuesQuery::new`] validation failures.
    pub fn query_for(&self, target: ResolvedTarget) -> Result<IssuesQuery, SqiError> {
        IssuesQuery::new(
            self.endpoint.clone(),
            self.mode,
            target,
            self.component_key.clone(),
            self.organization.clone(),
            self.timezone.clone(),
        )
    }
}
