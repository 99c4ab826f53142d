use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use vacancy_db::{Database, DatabaseConfig};

/// Spins up a PostgreSQL container and returns a config pointing at it.
///
/// Keep the `ContainerAsync` alive for the whole test; dropping it stops
/// the container.
pub async fn start_postgres() -> (DatabaseConfig, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "vacancies_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let config = DatabaseConfig {
        host: host.to_string(),
        port,
        user: "postgres".into(),
        password: "postgres".into(),
        dbname: "vacancies_test".into(),
        max_connections: 1,
    };

    (config, container)
}

/// Connect to `config`, retrying until the container accepts connections.
pub async fn connect_with_retry(config: &DatabaseConfig) -> Database {
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    loop {
        match Database::connect(config).await {
            Ok(db) => break db,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    }
}

/// Container with the schema in place, ready for store tests.
pub async fn setup_test_db() -> (Database, ContainerAsync<GenericImage>) {
    let (config, container) = start_postgres().await;
    let db = connect_with_retry(&config).await;

    db.create_tables().await.expect("Failed to create tables");

    (db, container)
}
