pub mod error;
pub mod ingest;
pub mod models;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::AppError;
pub use ingest::{IngestOutcome, IngestReport, IngestService, Skipped};
pub use models::{ApiEmployer, ApiVacancy, MalformedVacancy, NewVacancy, Vacancy, VacancyItem};
pub use traits::{JobBoard, VacancyStore};
