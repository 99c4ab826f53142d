//! Test utilities: in-memory implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::{
    ApiEmployer, ApiVacancy, CompanyVacancyCount, MalformedVacancy, NewVacancy, Vacancy,
    VacancyItem, VacancyListing,
};
use crate::traits::{CompanyBatch, FetchFailure, JobBoard, VacancyStore};

// ---------------------------------------------------------------------------
// MockJobBoard
// ---------------------------------------------------------------------------

/// Mock job board serving a fixed set of employers and vacancy lists.
///
/// Unknown employer ids come back as fetch failures; employers without a
/// registered vacancy list have no vacancies.
#[derive(Clone, Default)]
pub struct MockJobBoard {
    employers: Arc<Mutex<HashMap<u64, ApiEmployer>>>,
    vacancies: Arc<Mutex<HashMap<u64, Vec<VacancyItem>>>>,
    /// Served once, then the employer falls back to its vacancy list.
    vacancy_errors: Arc<Mutex<HashMap<u64, AppError>>>,
    pub requested_employers: Arc<Mutex<Vec<u64>>>,
    pub requested_vacancies: Arc<Mutex<Vec<u64>>>,
}

impl MockJobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employer(self, id: u64, name: &str) -> Self {
        self.employers.lock().unwrap().insert(
            id,
            ApiEmployer {
                id,
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_vacancies(self, employer_id: u64, vacancies: Vec<ApiVacancy>) -> Self {
        self.vacancies
            .lock()
            .unwrap()
            .entry(employer_id)
            .or_default()
            .extend(vacancies.into_iter().map(Ok));
        self
    }

    /// Append an item that failed to decode to the employer's page.
    pub fn with_malformed_vacancy(
        self,
        employer_id: u64,
        title: Option<&str>,
        reason: &str,
    ) -> Self {
        self.vacancies
            .lock()
            .unwrap()
            .entry(employer_id)
            .or_default()
            .push(Err(MalformedVacancy {
                title: title.map(str::to_string),
                reason: reason.to_string(),
            }));
        self
    }

    pub fn with_vacancy_error(self, employer_id: u64, error: AppError) -> Self {
        self.vacancy_errors
            .lock()
            .unwrap()
            .insert(employer_id, error);
        self
    }
}

impl JobBoard for MockJobBoard {
    async fn get_companies(&self, ids: &[u64]) -> CompanyBatch {
        let employers = self.employers.lock().unwrap();
        let mut batch = CompanyBatch::default();
        for &id in ids {
            self.requested_employers.lock().unwrap().push(id);
            match employers.get(&id) {
                Some(employer) => batch.companies.push(employer.clone()),
                None => batch.failures.push(FetchFailure {
                    employer_id: id,
                    reason: format!("Unexpected HTTP 404 for /employers/{id}"),
                }),
            }
        }
        batch
    }

    async fn get_vacancies(&self, employer_id: u64) -> Result<Vec<VacancyItem>, AppError> {
        self.requested_vacancies.lock().unwrap().push(employer_id);
        if let Some(e) = self.vacancy_errors.lock().unwrap().remove(&employer_id) {
            return Err(e);
        }
        Ok(self
            .vacancies
            .lock()
            .unwrap()
            .get(&employer_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

/// In-memory store. Employer keys are 1-based positions in `employers`.
#[derive(Clone, Default)]
pub struct MockStore {
    pub employers: Arc<Mutex<Vec<String>>>,
    pub vacancies: Arc<Mutex<Vec<NewVacancy>>>,
    /// Rows pretended to exist before the test started.
    existing: i64,
    failing_employers: Arc<Mutex<Vec<String>>>,
    failing_vacancies: Arc<Mutex<Vec<String>>>,
    count_error: Arc<Mutex<Option<AppError>>>,
    queries_fail: bool,
}

impl MockStore {
    /// Store with no rows; ingestion will run.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store whose vacancies table already has `count` rows.
    pub fn with_existing_vacancies(count: i64) -> Self {
        Self {
            existing: count,
            ..Self::default()
        }
    }

    /// Inserting an employer with this name fails.
    pub fn failing_employer(self, name: &str) -> Self {
        self.failing_employers
            .lock()
            .unwrap()
            .push(name.to_string());
        self
    }

    /// Inserting a vacancy with this title fails.
    pub fn failing_vacancy(self, name: &str) -> Self {
        self.failing_vacancies
            .lock()
            .unwrap()
            .push(name.to_string());
        self
    }

    /// The emptiness check returns this error once.
    pub fn with_count_error(self, error: AppError) -> Self {
        *self.count_error.lock().unwrap() = Some(error);
        self
    }

    /// Every read query returns a database error.
    pub fn with_failing_queries(mut self) -> Self {
        self.queries_fail = true;
        self
    }

    fn check_queries(&self) -> Result<(), AppError> {
        if self.queries_fail {
            return Err(AppError::DatabaseError("query failed".into()));
        }
        Ok(())
    }

    fn rows(&self) -> Vec<Vacancy> {
        self.vacancies
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, v)| Vacancy {
                id: i as i32 + 1,
                name: v.name.clone(),
                salary_min: v.salary_min,
                salary_max: v.salary_max,
                employer_id: Some(v.employer_id),
            })
            .collect()
    }

    fn average(&self) -> Option<f64> {
        let midpoints: Vec<f64> = self.rows().iter().filter_map(Vacancy::midpoint).collect();
        if midpoints.is_empty() {
            None
        } else {
            Some(midpoints.iter().sum::<f64>() / midpoints.len() as f64)
        }
    }
}

impl VacancyStore for MockStore {
    async fn insert_employer(&self, name: &str) -> Result<i32, AppError> {
        if self.failing_employers.lock().unwrap().iter().any(|n| n == name) {
            return Err(AppError::DatabaseError(format!("cannot insert {name}")));
        }
        let mut employers = self.employers.lock().unwrap();
        employers.push(name.to_string());
        Ok(employers.len() as i32)
    }

    async fn insert_vacancy(&self, vacancy: &NewVacancy) -> Result<(), AppError> {
        if self
            .failing_vacancies
            .lock()
            .unwrap()
            .iter()
            .any(|n| *n == vacancy.name)
        {
            return Err(AppError::DatabaseError(format!(
                "cannot insert {}",
                vacancy.name
            )));
        }
        let employers = self.employers.lock().unwrap().len();
        if vacancy.employer_id < 1 || vacancy.employer_id as usize > employers {
            return Err(AppError::DatabaseError(
                "violates foreign key constraint".into(),
            ));
        }
        self.vacancies.lock().unwrap().push(vacancy.clone());
        Ok(())
    }

    async fn count_vacancies(&self) -> Result<i64, AppError> {
        if let Some(e) = self.count_error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.existing + self.vacancies.lock().unwrap().len() as i64)
    }

    async fn get_companies_and_vacancies_count(
        &self,
    ) -> Result<Vec<CompanyVacancyCount>, AppError> {
        self.check_queries()?;
        let vacancies = self.vacancies.lock().unwrap();
        Ok(self
            .employers
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, name)| CompanyVacancyCount {
                name: name.clone(),
                vacancies_count: vacancies
                    .iter()
                    .filter(|v| v.employer_id == i as i32 + 1)
                    .count() as i64,
            })
            .collect())
    }

    async fn get_all_vacancies(&self) -> Result<Vec<VacancyListing>, AppError> {
        self.check_queries()?;
        let employers = self.employers.lock().unwrap();
        Ok(self
            .vacancies
            .lock()
            .unwrap()
            .iter()
            .filter_map(|v| {
                let company = employers.get(usize::try_from(v.employer_id - 1).ok()?)?;
                Some(VacancyListing {
                    company_name: company.clone(),
                    vacancy_title: v.name.clone(),
                    salary_min: v.salary_min,
                    salary_max: v.salary_max,
                })
            })
            .collect())
    }

    async fn get_avg_salary(&self) -> Result<Option<f64>, AppError> {
        self.check_queries()?;
        Ok(self.average())
    }

    async fn get_vacancies_with_higher_salary(&self) -> Result<Vec<Vacancy>, AppError> {
        self.check_queries()?;
        let Some(average) = self.average() else {
            return Ok(vec![]);
        };
        Ok(self
            .rows()
            .into_iter()
            .filter(|v| v.midpoint().is_some_and(|m| m > average))
            .collect())
    }

    async fn get_vacancies_with_keyword(&self, keyword: &str) -> Result<Vec<Vacancy>, AppError> {
        self.check_queries()?;
        let needle = keyword.to_lowercase();
        Ok(self
            .rows()
            .into_iter()
            .filter(|v| v.name.to_lowercase().contains(&needle))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Build an insert DTO for tests.
pub fn make_new_vacancy(
    name: &str,
    salary_min: Option<i32>,
    salary_max: Option<i32>,
    employer_id: i32,
) -> NewVacancy {
    NewVacancy {
        name: name.to_string(),
        salary_min,
        salary_max,
        employer_id,
    }
}
