use vacancy_db::{Database, DatabaseConfig};

use crate::integration::common::{connect_with_retry, setup_test_db, start_postgres};

#[tokio::test]
async fn create_database_creates_once() {
    let (config, _container) = start_postgres().await;
    // Wait for the server through the database the container already has.
    connect_with_retry(&config).await.close().await;

    let fresh = DatabaseConfig {
        dbname: "cw-5".into(),
        ..config
    };

    assert!(Database::create_database(&fresh).await.unwrap());
    assert!(!Database::create_database(&fresh).await.unwrap());

    let db = Database::connect(&fresh).await.unwrap();
    db.create_tables().await.unwrap();
    assert_eq!(db.vacancy_repo().count_vacancies().await.unwrap(), 0);
    db.close().await;
}

#[tokio::test]
async fn create_database_reports_existing_database() {
    let (config, _container) = start_postgres().await;
    connect_with_retry(&config).await.close().await;

    assert!(!Database::create_database(&config).await.unwrap());
}

#[tokio::test]
async fn create_tables_is_idempotent() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let id = repo.insert_employer("Yandex").await.unwrap();
    db.create_tables().await.unwrap();

    // Existing rows survive a second provisioning pass.
    let counts = repo.get_companies_and_vacancies_count().await.unwrap();
    assert_eq!(counts.len(), 1);
    assert!(id > 0);
}

#[tokio::test]
async fn employers_vacancies_count_column_defaults_to_zero() {
    let (db, _container) = setup_test_db().await;

    let id = db.vacancy_repo().insert_employer("Yandex").await.unwrap();

    let (count,): (Option<i32>,) =
        sqlx::query_as("SELECT vacancies_count FROM employers WHERE id = $1")
            .bind(id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(count, Some(0));
}

#[tokio::test]
async fn close_is_idempotent() {
    let (db, _container) = setup_test_db().await;

    db.close().await;
    db.close().await;

    assert!(db.pool().is_closed());
    assert!(db.vacancy_repo().count_vacancies().await.is_err());
}

#[tokio::test]
async fn connect_fails_loudly_for_unreachable_server() {
    let config = DatabaseConfig {
        host: "127.0.0.1".into(),
        // Nothing listens on the discard port.
        port: 9,
        ..DatabaseConfig::default()
    };

    let err = Database::connect(&config).await.err().expect("connect should fail");
    assert!(err.to_string().contains("Failed to connect"));
}
