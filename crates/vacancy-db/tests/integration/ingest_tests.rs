use vacancy_core::models::{ApiSalary, ApiVacancy};
use vacancy_core::testutil::MockJobBoard;
use vacancy_core::{IngestOutcome, IngestService};

use crate::integration::common::setup_test_db;

fn board() -> MockJobBoard {
    MockJobBoard::new()
        .with_employer(1740, "Yandex")
        .with_vacancies(
            1740,
            vec![
                ApiVacancy {
                    name: Some("Senior Engineer".into()),
                    salary: Some(ApiSalary {
                        from: Some(300),
                        to: Some(400),
                    }),
                },
                ApiVacancy {
                    name: Some("engineer II".into()),
                    salary: Some(ApiSalary {
                        from: Some(100),
                        to: Some(200),
                    }),
                },
            ],
        )
        .with_employer(80, "Alfa-Bank")
}

#[tokio::test]
async fn ingestion_loads_into_empty_database() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();
    let svc = IngestService::new(board(), repo.clone());

    let IngestOutcome::Loaded(report) = svc.run(&[1740, 80, 1]).await.unwrap() else {
        panic!("expected a load");
    };

    assert_eq!(report.employers_inserted, 2);
    assert_eq!(report.vacancies_inserted, 2);
    assert_eq!(report.skipped.len(), 1);

    let counts = repo.get_companies_and_vacancies_count().await.unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].vacancies_count, 2);
    assert_eq!(counts[1].vacancies_count, 0);
    assert_eq!(repo.get_avg_salary().await.unwrap(), Some(250.0));
}

#[tokio::test]
async fn rerun_against_loaded_database_inserts_nothing() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();
    let svc = IngestService::new(board(), repo.clone());

    svc.run(&[1740, 80]).await.unwrap();
    let second = svc.run(&[1740, 80]).await.unwrap();

    assert_eq!(second, IngestOutcome::AlreadyPopulated { existing: 2 });
    assert_eq!(repo.count_vacancies().await.unwrap(), 2);
    assert_eq!(
        repo.get_companies_and_vacancies_count().await.unwrap().len(),
        2
    );
}
