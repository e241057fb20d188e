/// 設定ファイル管理機能のテスト
///
/// このテストは、設定ファイルの読み込み、検証、接続URLと状態ファイルの解決が
/// 正しく動作することを確認します。

#[cfg(test)]
mod config_tests {
    use sqlreconcile::core::config::Config;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// 設定ファイルを読み込んで接続設定を取得できることを確認
    #[test]
    fn test_load_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(Config::DEFAULT_CONFIG_PATH);
        fs::write(
            &path,
            r#"
url: "mysql://root:pw@localhost:3306/app"
max_open_conns: 2
state_file: state/applied.json
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_open_conns, 2);
        assert_eq!(config.timeout, None);
        assert_eq!(
            config.resolve_url(None).unwrap(),
            "mysql://root:pw@localhost:3306/app"
        );
        assert_eq!(
            config.resolve_state_file(temp_dir.path(), None),
            temp_dir.path().join("state/applied.json")
        );
    }

    /// 明示指定したURLは設定ファイルより優先される
    #[test]
    fn test_explicit_url_wins_over_config() {
        let config = Config {
            url: Some("postgres://config".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_url(Some("sqlite://flag.db")).unwrap(),
            "sqlite://flag.db"
        );
    }

    /// 空のURLは検証エラー
    #[test]
    fn test_empty_url_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(Config::DEFAULT_CONFIG_PATH);
        fs::write(&path, "url: \"\"\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    /// 壊れたYAMLは解析エラー
    #[test]
    fn test_invalid_yaml_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(Config::DEFAULT_CONFIG_PATH);
        fs::write(&path, "max_open_conns: [not a number\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    /// 絶対パスの状態ファイルはそのまま使われる
    #[test]
    fn test_absolute_state_file() {
        let config = Config {
            state_file: Some("/var/lib/sqlreconcile/state.json".into()),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_state_file(Path::new("/project"), None),
            Path::new("/var/lib/sqlreconcile/state.json")
        );
    }
}
