use crate::errors::{AuthorityError, AuthorityResult};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "review_authority.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthorityConfig {
    /// Occupancy, in percent of capacity, a team must exceed before it gets a mentor.
    #[serde(default = "default_threshold")]
    pub mentor_threshold_percent: u8,
    /// Maximum number of names returned by the impersonation auto-complete.
    #[serde(default = "default_autocomplete_limit")]
    pub autocomplete_limit: usize,
    #[serde(default = "default_true")]
    pub audit_enabled: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_threshold() -> u8 {
    50
}

fn default_autocomplete_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        AuthorityConfig {
            mentor_threshold_percent: default_threshold(),
            autocomplete_limit: default_autocomplete_limit(),
            audit_enabled: true,
            log_level: default_log_level(),
        }
    }
}

impl AuthorityConfig {
    pub fn validate(&self) -> AuthorityResult<()> {
        if !(1..=100).contains(&self.mentor_threshold_percent) {
            return Err(AuthorityError::config(
                "mentor_threshold_percent must be between 1 and 100",
            ));
        }
        if self.autocomplete_limit == 0 {
            return Err(AuthorityError::config("autocomplete_limit must be positive"));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(AuthorityError::config(format!(
                "unknown log_level '{}'",
                self.log_level
            )));
        }
        Ok(())
    }
}

fn figment_for(path: Option<&str>) -> Figment {
    Figment::from(Serialized::defaults(AuthorityConfig::default()))
        .merge(Toml::file(path.unwrap_or(DEFAULT_CONFIG_FILE)))
        .merge(Env::prefixed("REVIEW_AUTHORITY_"))
}

/// Load configuration: defaults, then the TOML file (if present), then
/// `REVIEW_AUTHORITY_*` environment variables.
pub fn load_config(path: Option<&str>) -> AuthorityResult<AuthorityConfig> {
    let config: AuthorityConfig = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}
