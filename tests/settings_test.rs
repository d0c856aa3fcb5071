use spa_gateway::settings::{LogFormat, Settings, SettingsError, DEFAULT_BACKEND_URL, DEFAULT_MAX_CAPTURE_BYTES};

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;  // 환경 변수를 공유하므로 순차 실행

    const VARS: &[&str] = &[
        "PORT",
        "BACKEND_URL",
        "BACKEND_API_TOKEN",
        "ALLOW_CORS",
        "GATEWAY_ENV_FILE",
        "GATEWAY_STATIC_ROOT",
        "GATEWAY_INDEX_FILE",
        "GATEWAY_MAX_CAPTURE_BYTES",
        "GATEWAY_UPSTREAM_TIMEOUT_SECS",
        "GATEWAY_CONNECT_TIMEOUT_SECS",
        "GATEWAY_LOG_LEVEL",
        "GATEWAY_LOG_FORMAT",
        "GATEWAY_LOG_OUTPUT",
        "GATEWAY_EVENT_LOG",
        "GATEWAY_CONFIG_FILE",
    ];

    // 테스트 전후 환경변수 초기화를 위한 헬퍼 함수
    fn cleanup_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
        // 작업 디렉토리의 .env.local 대신 존재하지 않는 파일을 가리킵니다
        std::env::set_var("GATEWAY_ENV_FILE", "/nonexistent/.env.local");
    }

    // 테스트용 임시 TOML 파일 생성 헬퍼
    fn create_test_toml(content: &str) -> (String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("gateway.toml");
        std::fs::write(&file_path, content).unwrap();
        (file_path.to_str().unwrap().to_string(), dir)
    }

    #[tokio::test]
    #[serial]
    async fn test_default_settings() {
        cleanup_env();

        let settings = Settings::from_env().await.unwrap();
        assert_eq!(settings.server.http_port, 3000);
        assert_eq!(settings.server.static_root.to_str(), Some("dist"));
        assert_eq!(settings.server.index_file, "index.html");
        assert!(!settings.server.cors_enabled);
        assert_eq!(settings.server.max_capture_bytes, DEFAULT_MAX_CAPTURE_BYTES);
        assert_eq!(settings.upstream.origin.as_str().trim_end_matches('/'), DEFAULT_BACKEND_URL);
        assert_eq!(settings.upstream.timeout_secs, 30);
        assert!(settings.service_token.is_none());

        cleanup_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_env_overrides() {
        cleanup_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("BACKEND_URL", "http://127.0.0.1:9000");
        std::env::set_var("ALLOW_CORS", "TRUE");
        std::env::set_var("GATEWAY_MAX_CAPTURE_BYTES", "1048576");
        std::env::set_var("GATEWAY_LOG_FORMAT", "json");

        let settings = Settings::from_env().await.unwrap();
        assert_eq!(settings.server.http_port, 8080);
        assert_eq!(settings.upstream.origin.as_str(), "http://127.0.0.1:9000/");
        assert!(settings.server.cors_enabled);
        assert_eq!(settings.server.max_capture_bytes, 1_048_576);
        assert_eq!(settings.logging.format, LogFormat::Json);

        cleanup_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_cors_flag_only_accepts_true() {
        cleanup_env();
        std::env::set_var("ALLOW_CORS", "1");

        let settings = Settings::from_env().await.unwrap();
        assert!(!settings.server.cors_enabled);

        cleanup_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_settings_validation() {
        cleanup_env();

        // 1. 잘못된 포트 번호
        std::env::set_var("PORT", "99999");
        assert!(Settings::from_env().await.is_err());
        cleanup_env();

        std::env::set_var("PORT", "0");
        assert!(Settings::from_env().await.is_err());
        cleanup_env();

        // 2. 잘못된 백엔드 URL
        std::env::set_var("BACKEND_URL", "ftp://example.com");
        let err = Settings::from_env().await.unwrap_err();
        assert!(matches!(err, SettingsError::EnvVarInvalid { ref var_name, .. } if var_name == "BACKEND_URL"));
        cleanup_env();

        // 3. 캡처 상한 0
        std::env::set_var("GATEWAY_MAX_CAPTURE_BYTES", "0");
        assert!(Settings::from_env().await.is_err());
        cleanup_env();

        // 4. 잘못된 로그 레벨
        std::env::set_var("GATEWAY_LOG_LEVEL", "loud");
        assert!(Settings::from_env().await.is_err());
        cleanup_env();

        // 5. 제한 시간 0
        std::env::set_var("GATEWAY_UPSTREAM_TIMEOUT_SECS", "0");
        assert!(Settings::from_env().await.is_err());
        cleanup_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_token_resolved_from_env_file() {
        cleanup_env();
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env.local");
        std::fs::write(&env_file, "BACKEND_API_TOKEN=\"from-file\"\n").unwrap();
        std::env::set_var("GATEWAY_ENV_FILE", &env_file);

        let settings = Settings::from_env().await.unwrap();
        assert_eq!(settings.service_token.as_ref().map(|t| t.expose()), Some("from-file"));

        // 환경 변수가 파일보다 우선
        std::env::set_var("BACKEND_API_TOKEN", "from-env");
        let settings = Settings::from_env().await.unwrap();
        assert_eq!(settings.service_token.as_ref().map(|t| t.expose()), Some("from-env"));

        cleanup_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_toml_config_file() {
        cleanup_env();
        let (path, _dir) = create_test_toml(r#"
            [server]
            http_port = 9090
            cors_enabled = true
            max_capture_bytes = 4096

            [upstream]
            origin = "http://127.0.0.1:7000/base"
            timeout_secs = 5
        "#);
        std::env::set_var("GATEWAY_CONFIG_FILE", &path);
        std::env::set_var("BACKEND_API_TOKEN", "toml-run");

        let settings = Settings::load().await.unwrap();
        assert_eq!(settings.server.http_port, 9090);
        assert!(settings.server.cors_enabled);
        assert_eq!(settings.server.max_capture_bytes, 4096);
        assert_eq!(settings.upstream.origin.path(), "/base");
        assert_eq!(settings.upstream.timeout_secs, 5);
        assert_eq!(settings.service_token.as_ref().map(|t| t.expose()), Some("toml-run"));

        cleanup_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_toml_file_is_error() {
        cleanup_env();
        let err = Settings::from_toml_file("/nonexistent/gateway.toml").await.unwrap_err();
        assert!(matches!(err, SettingsError::FileError { .. }));
        cleanup_env();
    }
}
