use vacancy_core::testutil::make_new_vacancy;
use vacancy_db::VacancyRepository;

use crate::integration::common::setup_test_db;

/// Two employers; Yandex owns (100,200) and (300,400).
async fn seed_two_salaried(repo: &VacancyRepository) -> (i32, i32) {
    let yandex = repo.insert_employer("Yandex").await.unwrap();
    let alfa = repo.insert_employer("Alfa-Bank").await.unwrap();

    repo.insert_vacancy(&make_new_vacancy("Junior Developer", Some(100), Some(200), yandex))
        .await
        .unwrap();
    repo.insert_vacancy(&make_new_vacancy("Senior Developer", Some(300), Some(400), yandex))
        .await
        .unwrap();

    (yandex, alfa)
}

#[tokio::test]
async fn insert_employer_returns_generated_ids() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let first = repo.insert_employer("Yandex").await.unwrap();
    let second = repo.insert_employer("Alfa-Bank").await.unwrap();

    assert!(first > 0);
    assert!(second > first);
}

#[tokio::test]
async fn inserted_vacancy_is_listed_with_employer_name() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let yandex = repo.insert_employer("Yandex").await.unwrap();
    repo.insert_employer("Alfa-Bank").await.unwrap();
    repo.insert_vacancy(&make_new_vacancy("Rust Engineer", Some(100), None, yandex))
        .await
        .unwrap();

    let all = repo.get_all_vacancies().await.unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].company_name, "Yandex");
    assert_eq!(all[0].vacancy_title, "Rust Engineer");
    assert_eq!(all[0].salary_min, Some(100));
    assert_eq!(all[0].salary_max, None);
}

#[tokio::test]
async fn vacancy_for_unknown_employer_is_rolled_back() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let result = repo
        .insert_vacancy(&make_new_vacancy("Ghost", None, None, 4242))
        .await;

    assert!(result.is_err());
    assert_eq!(repo.count_vacancies().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_insert_leaves_the_store_usable() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    // VARCHAR(255)
    let too_long = "x".repeat(300);
    assert!(repo.insert_employer(&too_long).await.is_err());

    let id = repo.insert_employer("Yandex").await.unwrap();
    repo.insert_vacancy(&make_new_vacancy("Tester", None, None, id))
        .await
        .unwrap();

    let counts = repo.get_companies_and_vacancies_count().await.unwrap();
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[0].name, "Yandex");
}

#[tokio::test]
async fn companies_count_includes_employers_without_vacancies() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    seed_two_salaried(&repo).await;

    let counts = repo.get_companies_and_vacancies_count().await.unwrap();

    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].name, "Yandex");
    assert_eq!(counts[0].vacancies_count, 2);
    assert_eq!(counts[1].name, "Alfa-Bank");
    assert_eq!(counts[1].vacancies_count, 0);
}

#[tokio::test]
async fn avg_salary_is_mean_of_midpoints() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    seed_two_salaried(&repo).await;

    assert_eq!(repo.get_avg_salary().await.unwrap(), Some(250.0));
}

#[tokio::test]
async fn avg_salary_skips_rows_with_a_missing_bound() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let (yandex, alfa) = seed_two_salaried(&repo).await;
    repo.insert_vacancy(&make_new_vacancy("Only min", Some(10_000), None, alfa))
        .await
        .unwrap();
    repo.insert_vacancy(&make_new_vacancy("Only max", None, Some(1), yandex))
        .await
        .unwrap();
    repo.insert_vacancy(&make_new_vacancy("No salary", None, None, yandex))
        .await
        .unwrap();

    assert_eq!(repo.get_avg_salary().await.unwrap(), Some(250.0));
}

#[tokio::test]
async fn avg_salary_is_none_without_salaried_vacancies() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    assert_eq!(repo.get_avg_salary().await.unwrap(), None);

    let id = repo.insert_employer("Yandex").await.unwrap();
    repo.insert_vacancy(&make_new_vacancy("No salary", None, None, id))
        .await
        .unwrap();

    assert_eq!(repo.get_avg_salary().await.unwrap(), None);
}

#[tokio::test]
async fn avg_salary_does_not_overflow_on_large_bounds() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let id = repo.insert_employer("Yandex").await.unwrap();
    repo.insert_vacancy(&make_new_vacancy("Huge", Some(i32::MAX), Some(i32::MAX), id))
        .await
        .unwrap();

    assert_eq!(
        repo.get_avg_salary().await.unwrap(),
        Some(f64::from(i32::MAX))
    );
}

#[tokio::test]
async fn higher_salary_returns_only_vacancies_above_average() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let (_, alfa) = seed_two_salaried(&repo).await;
    // No midpoint, never above the average.
    repo.insert_vacancy(&make_new_vacancy("Only min", Some(99_999), None, alfa))
        .await
        .unwrap();

    let above = repo.get_vacancies_with_higher_salary().await.unwrap();

    assert_eq!(above.len(), 1);
    assert_eq!(above[0].name, "Senior Developer");
    assert_eq!(above[0].midpoint(), Some(350.0));
}

#[tokio::test]
async fn higher_salary_is_empty_without_vacancies() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    assert!(repo.get_vacancies_with_higher_salary().await.unwrap().is_empty());
}

#[tokio::test]
async fn higher_salary_is_strict() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let id = repo.insert_employer("Yandex").await.unwrap();
    repo.insert_vacancy(&make_new_vacancy("A", Some(100), Some(200), id))
        .await
        .unwrap();
    repo.insert_vacancy(&make_new_vacancy("B", Some(120), Some(180), id))
        .await
        .unwrap();

    assert!(repo.get_vacancies_with_higher_salary().await.unwrap().is_empty());
}

#[tokio::test]
async fn keyword_search_is_case_insensitive_substring() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let id = repo.insert_employer("Yandex").await.unwrap();
    for title in ["Senior Engineer", "engineer II", "Product Manager"] {
        repo.insert_vacancy(&make_new_vacancy(title, None, None, id))
            .await
            .unwrap();
    }

    let found = repo.get_vacancies_with_keyword("engineer").await.unwrap();
    let titles: Vec<_> = found.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(titles, vec!["Senior Engineer", "engineer II"]);
    assert!(found.iter().all(|v| v.employer_id == Some(id)));

    assert!(
        repo.get_vacancies_with_keyword("astronaut")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn keyword_wildcards_match_literally() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    let id = repo.insert_employer("Yandex").await.unwrap();
    for title in ["100% remote", "1000 tickets", "C_level advisor", "Clevel"] {
        repo.insert_vacancy(&make_new_vacancy(title, None, None, id))
            .await
            .unwrap();
    }

    let percent = repo.get_vacancies_with_keyword("100%").await.unwrap();
    assert_eq!(percent.len(), 1);
    assert_eq!(percent[0].name, "100% remote");

    let underscore = repo.get_vacancies_with_keyword("c_l").await.unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].name, "C_level advisor");
}

#[tokio::test]
async fn count_vacancies_counts_rows() {
    let (db, _container) = setup_test_db().await;
    let repo = db.vacancy_repo();

    assert_eq!(repo.count_vacancies().await.unwrap(), 0);
    seed_two_salaried(&repo).await;
    assert_eq!(repo.count_vacancies().await.unwrap(), 2);
}
