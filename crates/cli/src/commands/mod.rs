//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use contracts::RelayBlueprint;
use secrecy::SecretString;

use crate::error::{CliError, Result};

/// Load and validate a configuration file
fn load_blueprint(path: &Path) -> Result<RelayBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }
    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}

/// Token given on the command line or through `FACT_RELAY_AUTH_TOKEN`
fn cli_auth_token(arg: Option<&str>) -> Option<SecretString> {
    arg.filter(|token| !token.is_empty())
        .map(|token| SecretString::from(token.to_string()))
}

/// Whether the http sink will send a bearer token
///
/// The CLI token wins over `sink.params.auth_token`, as in `run`.
fn has_auth_token(blueprint: &RelayBlueprint, arg: Option<&str>) -> bool {
    cli_auth_token(arg).is_some()
        || blueprint
            .sink
            .params
            .get("auth_token")
            .is_some_and(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    fn http_blueprint(params: &str) -> RelayBlueprint {
        ConfigLoader::load_from_str(
            &format!(
                r#"
[sink]
name = "kpi"
sink_type = "http"
[sink.params]
url = "https://example.invalid/save"
{params}
"#
            ),
            ConfigFormat::Toml,
        )
        .unwrap()
    }

    #[test]
    fn test_auth_token_from_cli_or_config() {
        let bare = http_blueprint("");
        assert!(!has_auth_token(&bare, None));
        assert!(!has_auth_token(&bare, Some("")));
        assert!(has_auth_token(&bare, Some("from-env")));

        let configured = http_blueprint(r#"auth_token = "from-config""#);
        assert!(has_auth_token(&configured, None));
    }
}
