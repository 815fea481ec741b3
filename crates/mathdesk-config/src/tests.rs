#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_dev_server() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.history.max_entries, None);
        assert_eq!(config.solver.timeout(), None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 8080

            [solver]
            timeout_ms = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.solver.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.web, WebConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml_str("[server]\nport = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("definitely/not/here/mathdesk.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("MATHDESK_HOST", "0.0.0.0"), ("MATHDESK_PORT", "9000")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_bad_port_override_is_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(|key| (key == "MATHDESK_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MATHDESK_PORT", .. }));
    }
}
