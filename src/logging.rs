use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Target of per-request gate decisions (accepted, rejected, body refused).
pub const AUTH_TARGET: &str = "ingest_gate::auth";

/// Directives used when `RUST_LOG` is unset.
///
/// sqlx logs every statement at info, so it is held at warn. Gate decisions
/// follow `auth.log_level`, falling back to the global level.
pub fn filter_directives(config: &AppConfig) -> String {
    let auth_level = config
        .auth
        .log_level
        .as_deref()
        .unwrap_or(&config.log_level);
    format!(
        "{},sqlx=warn,{}={}",
        config.log_level, AUTH_TARGET, auth_level
    )
}

/// Install the global subscriber. Keep the guard alive for the process
/// lifetime or buffered file output is lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        // tenant_id, device_id and code land top-level for log queries
        let json_layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_target(true)
            .with_writer(writer)
            .with_ansi(false);
        registry.with(json_layer).init();
    } else {
        // file keeps the target so auth lines can be grepped out
        let file_layer = fmt::layer()
            .with_target(true)
            .with_writer(writer)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev_config() -> AppConfig {
        AppConfig::from_yaml(include_str!("../config/dev.yaml")).unwrap()
    }

    #[test]
    fn test_auth_level_inherits_global_level() {
        let mut config = dev_config();
        config.auth.log_level = None;
        assert_eq!(
            filter_directives(&config),
            "debug,sqlx=warn,ingest_gate::auth=debug"
        );
    }

    #[test]
    fn test_auth_level_overrides() {
        let mut config = dev_config();
        config.log_level = "info".to_string();
        config.auth.log_level = Some("warn".to_string());
        let directives = filter_directives(&config);
        assert_eq!(directives, "info,sqlx=warn,ingest_gate::auth=warn");
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_shipped_prod_directives_parse() {
        let config = AppConfig::from_yaml(include_str!("../config/prod.yaml")).unwrap();
        assert!(EnvFilter::try_new(filter_directives(&config)).is_ok());
    }
}
