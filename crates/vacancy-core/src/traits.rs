use std::future::Future;

use crate::error::AppError;
use crate::models::{
    ApiEmployer, CompanyVacancyCount, NewVacancy, Vacancy, VacancyItem, VacancyListing,
};

/// Employers that could not be fetched, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub employer_id: u64,
    pub reason: String,
}

/// Result of fetching a list of employers: the ones that came back, in input
/// order, and the ones that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyBatch {
    pub companies: Vec<ApiEmployer>,
    pub failures: Vec<FetchFailure>,
}

/// Read-only access to a job-listings API.
pub trait JobBoard: Send + Sync + Clone {
    /// Fetch employers one by one. Never fails as a whole: each id either
    /// yields an employer or a [`FetchFailure`].
    fn get_companies(&self, ids: &[u64]) -> impl Future<Output = CompanyBatch> + Send;

    /// Fetch the vacancies published by one employer. The outer error covers
    /// the request; each item carries its own decode result.
    fn get_vacancies(
        &self,
        employer_id: u64,
    ) -> impl Future<Output = Result<Vec<VacancyItem>, AppError>> + Send;
}

/// Persists employers and vacancies and answers the canned queries.
pub trait VacancyStore: Send + Sync + Clone {
    /// Insert an employer. Returns the generated key.
    fn insert_employer(&self, name: &str) -> impl Future<Output = Result<i32, AppError>> + Send;

    fn insert_vacancy(
        &self,
        vacancy: &NewVacancy,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Number of rows in the vacancies table.
    fn count_vacancies(&self) -> impl Future<Output = Result<i64, AppError>> + Send;

    /// Every employer once, with zero for employers without vacancies.
    fn get_companies_and_vacancies_count(
        &self,
    ) -> impl Future<Output = Result<Vec<CompanyVacancyCount>, AppError>> + Send;

    /// Vacancies joined to their employer.
    fn get_all_vacancies(
        &self,
    ) -> impl Future<Output = Result<Vec<VacancyListing>, AppError>> + Send;

    /// Mean salary midpoint. Rows missing a bound do not count.
    fn get_avg_salary(&self) -> impl Future<Output = Result<Option<f64>, AppError>> + Send;

    /// Vacancies whose midpoint is strictly above [`get_avg_salary`](Self::get_avg_salary).
    fn get_vacancies_with_higher_salary(
        &self,
    ) -> impl Future<Output = Result<Vec<Vacancy>, AppError>> + Send;

    /// Case-insensitive substring search on the vacancy title.
    fn get_vacancies_with_keyword(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<Vec<Vacancy>, AppError>> + Send;
}
