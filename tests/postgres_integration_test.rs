/// PostgreSQL統合テスト
///
/// testcontainersを使用して実際のPostgreSQLに対する調整と行射影を検証します。
///
/// 注意: このテストはDockerが必要です。通常のテスト実行ではスキップされます。

#[cfg(test)]
mod postgres_integration_tests {
    use sqlreconcile::adapters::connection_string::parse_url;
    use sqlreconcile::adapters::database::{DatabaseConnectionService, DatabasePool};
    use sqlreconcile::adapters::executor::PoolExecutor;
    use sqlreconcile::core::config::Config;
    use sqlreconcile::core::driver::DriverIdentity;
    use sqlreconcile::core::migration::{Migration, MigrationSequence};
    use sqlreconcile::core::uniform::{Number, UniformType, UniformValue};
    use sqlreconcile::services::reconciler::MigrationReconciler;
    use sqlreconcile::services::row_projector::RowProjector;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::postgres::Postgres;
    use tokio_util::sync::CancellationToken;

    /// PostgreSQLコンテナを起動して接続プールを作成
    async fn setup_postgres_container(
    ) -> Result<(ContainerAsync<Postgres>, DriverIdentity, DatabasePool), Box<dyn std::error::Error>>
    {
        let container = Postgres::default().with_tag("16-alpine").start().await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

        let data_source = parse_url(&url)?;
        let pool = DatabaseConnectionService::new()
            .create_pool(&data_source, &Config::default())
            .await?;

        Ok((container, data_source.driver, pool))
    }

    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_reconcile_and_project_on_postgres() {
        let (_container, driver, pool) = setup_postgres_container().await.unwrap();
        assert_eq!(driver, DriverIdentity::Postgres);

        let executor = PoolExecutor::new(&pool);
        let reconciler = MigrationReconciler::new();
        let cancel = CancellationToken::new();

        let t = Migration::new("t", "CREATE TABLE t(id int, name text)", "DROP TABLE t");
        let r1 = Migration::new(
            "r1",
            "INSERT INTO t VALUES(1, NULL)",
            "DELETE FROM t WHERE id=1",
        );
        let planned = MigrationSequence::from(vec![t.clone(), r1]);

        reconciler
            .reconcile(&executor, &planned, &MigrationSequence::new(), &cancel)
            .await
            .unwrap();

        let result = {
            let mut cursor = pool.query("SELECT id, name, 1 + 1 FROM t");
            RowProjector::new(driver, cursor.as_mut())
                .collect()
                .await
                .unwrap()
        };

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["id"].as_i64(), Some(1));
        assert_eq!(result.rows[0]["name"], UniformValue::Null);
        assert_eq!(result.rows[0]["column2"].as_i64(), Some(2));
        assert_eq!(result.row_type["name"], UniformType::String);

        let outcome = reconciler
            .reconcile(&executor, &MigrationSequence::new(), &planned, &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.undone, vec!["r1", "t"]);

        pool.close().await;
    }

    /// 日時・通貨・固定小数点・JSON・UUID の射影
    #[tokio::test]
    #[ignore] // Docker必須のため、通常のテスト実行ではスキップ
    async fn test_project_temporal_and_numeric_types_on_postgres() {
        let (_container, driver, pool) = setup_postgres_container().await.unwrap();

        let sql = "SELECT
                TIMESTAMPTZ '2024-01-02 05:04:05+02' AS at,
                TIMESTAMP '2024-01-02 03:04:05.678' AS local_at,
                DATE '2024-01-02' AS day,
                TIME '13:04:05' AS clock,
                12.50::money AS price,
                10.25::numeric AS amount,
                '{\"a\": 1}'::jsonb AS doc,
                '00112233-4455-6677-8899-aabbccddeeff'::uuid AS key,
                (SELECT MAX(x) FROM generate_series(1, 0) AS x) AS empty_max";
        let result = {
            let mut cursor = pool.query(sql);
            RowProjector::new(driver, cursor.as_mut())
                .collect()
                .await
                .unwrap()
        };

        let row = &result.rows[0];
        assert_eq!(row["at"].as_str(), Some("2024-01-02T03:04:05Z"));
        assert_eq!(row["local_at"].as_str(), Some("2024-01-02T03:04:05Z"));
        assert_eq!(row["day"].as_str(), Some("2024-01-02T00:00:00Z"));
        assert_eq!(row["clock"].as_str(), Some("13:04:05"));
        assert_eq!(row["price"].as_str(), Some("12.50"));
        assert_eq!(row["amount"], UniformValue::Number(Number::Float(10.25)));
        assert_eq!(row["doc"].as_str(), Some("{\"a\":1}"));
        assert_eq!(
            row["key"].as_str(),
            Some("00112233-4455-6677-8899-aabbccddeeff")
        );
        assert_eq!(row["empty_max"], UniformValue::Null);

        assert_eq!(result.row_type["at"], UniformType::String);
        assert_eq!(result.row_type["price"], UniformType::String);
        assert_eq!(result.row_type["amount"], UniformType::Number);
        assert_eq!(result.row_type["empty_max"], UniformType::Number);

        pool.close().await;
    }
}
