use std::fmt;

use crate::error::AppError;
use crate::models::{ApiEmployer, ApiVacancy, NewVacancy};
use crate::traits::{JobBoard, VacancyStore};

/// One item the ingestion could not load, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    /// The employer record could not be fetched.
    EmployerFetch { employer_id: u64, reason: String },
    /// The employer was fetched but not stored; its vacancies were not loaded.
    EmployerInsert {
        employer_id: u64,
        name: String,
        reason: String,
    },
    /// The employer's vacancy list could not be fetched.
    VacancyFetch { employer_id: u64, reason: String },
    /// One element of the vacancy list could not be decoded.
    VacancyDecode {
        employer_id: u64,
        title: Option<String>,
        reason: String,
    },
    /// A single vacancy was not stored.
    VacancyInsert {
        employer_id: u64,
        title: Option<String>,
        reason: String,
    },
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skipped::EmployerFetch {
                employer_id,
                reason,
            } => write!(f, "employer {employer_id}: fetch failed: {reason}"),
            Skipped::EmployerInsert {
                employer_id,
                name,
                reason,
            } => write!(f, "employer {employer_id} ({name}): insert failed: {reason}"),
            Skipped::VacancyFetch {
                employer_id,
                reason,
            } => write!(f, "employer {employer_id}: vacancy fetch failed: {reason}"),
            Skipped::VacancyDecode {
                employer_id,
                title,
                reason,
            } => write!(
                f,
                "employer {employer_id}: vacancy '{}' unreadable: {reason}",
                title.as_deref().unwrap_or("<untitled>")
            ),
            Skipped::VacancyInsert {
                employer_id,
                title,
                reason,
            } => write!(
                f,
                "employer {employer_id}: vacancy '{}' skipped: {reason}",
                title.as_deref().unwrap_or("<untitled>")
            ),
        }
    }
}

/// What a load pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub companies_fetched: usize,
    pub employers_inserted: usize,
    pub vacancies_inserted: usize,
    pub skipped: Vec<Skipped>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Result of [`IngestService::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The vacancies table already had rows; nothing was fetched or inserted.
    AlreadyPopulated { existing: i64 },
    Loaded(IngestReport),
}

/// Loads employers and their vacancies from a [`JobBoard`] into a
/// [`VacancyStore`], once.
///
/// The run is guarded by an emptiness check on the vacancies table so that
/// starting the tool again does not duplicate data. The guard only tells
/// "empty" from "non-empty": a run that stopped halfway is not resumed.
pub struct IngestService<B, S>
where
    B: JobBoard,
    S: VacancyStore,
{
    board: B,
    store: S,
}

impl<B, S> IngestService<B, S>
where
    B: JobBoard,
    S: VacancyStore,
{
    pub fn new(board: B, store: S) -> Self {
        Self { board, store }
    }

    /// Check the store and, if it holds no vacancies, fetch and load every
    /// configured employer.
    ///
    /// Only a failure of the emptiness check is returned as an error; every
    /// per-item failure past that point ends up in [`IngestReport::skipped`].
    pub async fn run(&self, employer_ids: &[u64]) -> Result<IngestOutcome, AppError> {
        let existing = self.store.count_vacancies().await?;
        if existing > 0 {
            tracing::info!(existing, "Vacancies already loaded, skipping ingestion");
            return Ok(IngestOutcome::AlreadyPopulated { existing });
        }

        tracing::info!(
            employers = employer_ids.len(),
            "No vacancies in the database, loading from the API"
        );
        let report = self.load(employer_ids).await;
        tracing::info!(
            employers = report.employers_inserted,
            vacancies = report.vacancies_inserted,
            skipped = report.skipped.len(),
            "Ingestion finished"
        );

        Ok(IngestOutcome::Loaded(report))
    }

    async fn load(&self, employer_ids: &[u64]) -> IngestReport {
        let batch = self.board.get_companies(employer_ids).await;

        let mut report = IngestReport {
            companies_fetched: batch.companies.len(),
            ..Default::default()
        };
        report
            .skipped
            .extend(batch.failures.into_iter().map(|f| Skipped::EmployerFetch {
                employer_id: f.employer_id,
                reason: f.reason,
            }));

        for company in &batch.companies {
            self.load_company(company, &mut report).await;
        }

        report
    }

    async fn load_company(&self, company: &ApiEmployer, report: &mut IngestReport) {
        let key = match self.store.insert_employer(&company.name).await {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(employer_id = company.id, error = %e, "Failed to insert employer");
                report.skipped.push(Skipped::EmployerInsert {
                    employer_id: company.id,
                    name: company.name.clone(),
                    reason: e.to_string(),
                });
                return;
            }
        };
        report.employers_inserted += 1;
        tracing::info!(employer_id = company.id, key, "Employer '{}' stored", company.name);

        let vacancies = match self.board.get_vacancies(company.id).await {
            Ok(vacancies) => vacancies,
            Err(e) => {
                if e.is_soft_fetch_failure() {
                    tracing::warn!(employer_id = company.id, error = %e, "Could not fetch vacancies");
                } else {
                    tracing::error!(employer_id = company.id, error = %e, "Could not fetch vacancies");
                }
                report.skipped.push(Skipped::VacancyFetch {
                    employer_id: company.id,
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };

        for item in vacancies {
            match item {
                Ok(vacancy) => self.load_vacancy(company.id, key, vacancy, report).await,
                Err(malformed) => {
                    tracing::warn!(
                        employer_id = company.id,
                        reason = %malformed.reason,
                        "Could not decode vacancy, skipping"
                    );
                    report.skipped.push(Skipped::VacancyDecode {
                        employer_id: company.id,
                        title: malformed.title,
                        reason: malformed.reason,
                    });
                }
            }
        }
    }

    async fn load_vacancy(
        &self,
        employer_id: u64,
        key: i32,
        vacancy: ApiVacancy,
        report: &mut IngestReport,
    ) {
        let (salary_min, salary_max) = vacancy.salary_bounds();

        let Some(name) = vacancy.name else {
            tracing::warn!(employer_id, "Vacancy without a title, skipping");
            report.skipped.push(Skipped::VacancyInsert {
                employer_id,
                title: None,
                reason: "vacancy has no title".into(),
            });
            return;
        };

        if let (Some(min), Some(max)) = (salary_min, salary_max)
            && min > max
        {
            // Stored as-is; the range is not validated.
            tracing::warn!(employer_id, min, max, "Vacancy '{}' has salary min above max", name);
        }

        let new_vacancy = NewVacancy {
            name,
            salary_min,
            salary_max,
            employer_id: key,
        };

        match self.store.insert_vacancy(&new_vacancy).await {
            Ok(()) => report.vacancies_inserted += 1,
            Err(e) => {
                tracing::error!(employer_id, error = %e, "Failed to insert vacancy '{}'", new_vacancy.name);
                report.skipped.push(Skipped::VacancyInsert {
                    employer_id,
                    title: Some(new_vacancy.name),
                    reason: e.to_string(),
                });
            }
        }
    }
}
