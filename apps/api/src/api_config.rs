use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use warden_application::{DEFAULT_WRITE_TIMEOUT, ReconcileMode, ReconcilerConfig, SecurityPolicy};
use warden_core::AppError;
use warden_domain::AccessLevel;

/// Runtime configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub security_policy: SecurityPolicy,
    pub reconciler: ReconcilerConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let security_policy = security_policy_from(
            env::var("RBAC_SECURITY_ENABLED").ok().as_deref(),
            env::var("RBAC_DISABLED_ACCESS_LEVEL").ok().as_deref(),
        )?;
        let reconciler = reconciler_config_from(
            env::var("RBAC_RECONCILE_MODE").ok().as_deref(),
            env::var("RBAC_WRITE_TIMEOUT_MS").ok().as_deref(),
        )?;

        Ok(Self {
            migrate_only,
            database_url,
            api_host,
            api_port,
            cookie_secure,
            security_policy,
            reconciler,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn security_policy_from(
    enabled: Option<&str>,
    disabled_level: Option<&str>,
) -> Result<SecurityPolicy, AppError> {
    let security_enabled = match enabled.map(str::trim).filter(|value| !value.is_empty()) {
        None => true,
        Some(value) => parse_bool("RBAC_SECURITY_ENABLED", value)?,
    };

    if security_enabled {
        return Ok(SecurityPolicy::enforced());
    }

    let level = match disabled_level.map(str::trim).filter(|value| !value.is_empty()) {
        None => AccessLevel::None,
        Some(value) => AccessLevel::from_str(value).map_err(|error| {
            AppError::Validation(format!("invalid RBAC_DISABLED_ACCESS_LEVEL: {error}"))
        })?,
    };

    Ok(SecurityPolicy::disabled(level))
}

fn reconciler_config_from(
    mode: Option<&str>,
    timeout_ms: Option<&str>,
) -> Result<ReconcilerConfig, AppError> {
    let mode = match mode.map(str::trim).filter(|value| !value.is_empty()) {
        None => ReconcileMode::default(),
        Some(value) => ReconcileMode::from_str(value)?,
    };

    let write_timeout = match timeout_ms.map(str::trim).filter(|value| !value.is_empty()) {
        None => DEFAULT_WRITE_TIMEOUT,
        Some(value) => value
            .parse::<u64>()
            .ok()
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "RBAC_WRITE_TIMEOUT_MS must be a positive integer, got '{value}'"
                ))
            })?,
    };

    Ok(ReconcilerConfig {
        mode,
        write_timeout,
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool, AppError> {
    if value.eq_ignore_ascii_case("true") || value == "1" {
        return Ok(true);
    }
    if value.eq_ignore_ascii_case("false") || value == "0" {
        return Ok(false);
    }

    Err(AppError::Validation(format!(
        "{name} must be 'true' or 'false', got '{value}'"
    )))
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use warden_application::{DEFAULT_WRITE_TIMEOUT, ReconcileMode, SecurityPolicy};
    use warden_core::AppError;
    use warden_domain::AccessLevel;

    use super::{reconciler_config_from, security_policy_from};

    #[test]
    fn security_defaults_to_enforced() {
        assert_eq!(
            security_policy_from(None, Some("FULL")).ok(),
            Some(SecurityPolicy::enforced())
        );
    }

    #[test]
    fn disabled_security_reads_the_configured_level() {
        assert_eq!(
            security_policy_from(Some("false"), Some("view")).ok(),
            Some(SecurityPolicy::disabled(AccessLevel::View))
        );
        assert_eq!(
            security_policy_from(Some("FALSE"), None).ok(),
            Some(SecurityPolicy::disabled(AccessLevel::None))
        );
    }

    #[test]
    fn malformed_security_values_are_rejected() {
        assert!(matches!(
            security_policy_from(Some("maybe"), None),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            security_policy_from(Some("false"), Some("ADMIN")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn reconciler_defaults_to_snapshot_with_default_timeout() {
        let Ok(config) = reconciler_config_from(None, None) else {
            panic!("defaults should load");
        };

        assert_eq!(config.mode, ReconcileMode::Snapshot);
        assert_eq!(config.write_timeout, DEFAULT_WRITE_TIMEOUT);
    }

    #[test]
    fn reconciler_reads_mode_and_timeout() {
        let Ok(config) = reconciler_config_from(Some("patch"), Some("250")) else {
            panic!("config should load");
        };

        assert_eq!(config.mode, ReconcileMode::Patch);
        assert_eq!(config.write_timeout, Duration::from_millis(250));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(matches!(
            reconciler_config_from(None, Some("0")),
            Err(AppError::Validation(_))
        ));
    }
}
