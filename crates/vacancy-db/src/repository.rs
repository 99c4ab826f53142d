use sqlx::{PgPool, Pool, Postgres};
use vacancy_core::error::AppError;
use vacancy_core::models::{CompanyVacancyCount, NewVacancy, Vacancy, VacancyListing};

/// Repository for employers and vacancies in PostgreSQL.
///
/// Writes run in their own transaction: committed on success, rolled back
/// when the transaction is dropped on error.
#[derive(Clone)]
pub struct VacancyRepository {
    pool: Pool<Postgres>,
}

impl VacancyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an employer. Returns the generated id.
    pub async fn insert_employer(&self, name: &str) -> Result<i32, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let (id,): (i32,) =
            sqlx::query_as(r#"INSERT INTO employers (name) VALUES ($1) RETURNING id"#)
                .bind(name)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(id, "Employer '{}' inserted", name);
        Ok(id)
    }

    /// Insert a vacancy for an existing employer.
    pub async fn insert_vacancy(&self, vacancy: &NewVacancy) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO vacancies (name, salary_min, salary_max, employer_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&vacancy.name)
        .bind(vacancy.salary_min)
        .bind(vacancy.salary_max)
        .bind(vacancy.employer_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            employer_id = vacancy.employer_id,
            "Vacancy '{}' inserted",
            vacancy.name
        );
        Ok(())
    }

    /// Number of stored vacancies.
    pub async fn count_vacancies(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM vacancies"#)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(count)
    }

    /// Every employer with the number of vacancies it owns, zero included.
    pub async fn get_companies_and_vacancies_count(
        &self,
    ) -> Result<Vec<CompanyVacancyCount>, AppError> {
        let rows = sqlx::query_as::<_, CompanyCountRow>(
            r#"
            SELECT e.name, COUNT(v.id) AS vacancies_count
            FROM employers e
            LEFT JOIN vacancies v ON e.id = v.employer_id
            GROUP BY e.id, e.name
            ORDER BY e.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// All vacancies that belong to a known employer, with the employer name.
    pub async fn get_all_vacancies(&self) -> Result<Vec<VacancyListing>, AppError> {
        let rows = sqlx::query_as::<_, VacancyListingRow>(
            r#"
            SELECT e.name AS company_name, v.name AS vacancy_title, v.salary_min, v.salary_max
            FROM vacancies v
            JOIN employers e ON v.employer_id = e.id
            ORDER BY v.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Average salary midpoint.
    ///
    /// `AVG` skips the NULL midpoints of rows with a missing bound, so those
    /// rows do not count at all. `None` when no row has both bounds.
    // TODO: decide whether rows with a single bound should contribute that bound.
    pub async fn get_avg_salary(&self) -> Result<Option<f64>, AppError> {
        let avg: Option<f64> = sqlx::query_scalar(
            r#"SELECT AVG((salary_min::BIGINT + salary_max) / 2.0)::FLOAT8 FROM vacancies"#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(avg)
    }

    /// Vacancies whose midpoint is strictly above the current average.
    ///
    /// The average is queried again on every call.
    pub async fn get_vacancies_with_higher_salary(&self) -> Result<Vec<Vacancy>, AppError> {
        let Some(avg) = self.get_avg_salary().await? else {
            return Ok(vec![]);
        };

        let rows = sqlx::query_as::<_, VacancyRow>(
            r#"
            SELECT id, name, salary_min, salary_max, employer_id
            FROM vacancies
            WHERE ((salary_min::BIGINT + salary_max) / 2.0)::FLOAT8 > $1
            ORDER BY id
            "#,
        )
        .bind(avg)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Vacancies whose title contains `keyword`, ignoring case.
    pub async fn get_vacancies_with_keyword(&self, keyword: &str) -> Result<Vec<Vacancy>, AppError> {
        let rows = sqlx::query_as::<_, VacancyRow>(
            r#"
            SELECT id, name, salary_min, salary_max, employer_id
            FROM vacancies
            WHERE name ILIKE $1
            ORDER BY id
            "#,
        )
        .bind(contains_pattern(keyword))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// `%keyword%` with LIKE wildcards in the keyword matched literally.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct CompanyCountRow {
    name: String,
    vacancies_count: i64,
}

impl From<CompanyCountRow> for CompanyVacancyCount {
    fn from(row: CompanyCountRow) -> Self {
        CompanyVacancyCount {
            name: row.name,
            vacancies_count: row.vacancies_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VacancyListingRow {
    company_name: String,
    vacancy_title: String,
    salary_min: Option<i32>,
    salary_max: Option<i32>,
}

impl From<VacancyListingRow> for VacancyListing {
    fn from(row: VacancyListingRow) -> Self {
        VacancyListing {
            company_name: row.company_name,
            vacancy_title: row.vacancy_title,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VacancyRow {
    id: i32,
    name: String,
    salary_min: Option<i32>,
    salary_max: Option<i32>,
    employer_id: Option<i32>,
}

impl From<VacancyRow> for Vacancy {
    fn from(row: VacancyRow) -> Self {
        Vacancy {
            id: row.id,
            name: row.name,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
            employer_id: row.employer_id,
        }
    }
}

// -- Trait implementation --

impl vacancy_core::traits::VacancyStore for VacancyRepository {
    async fn insert_employer(&self, name: &str) -> Result<i32, AppError> {
        VacancyRepository::insert_employer(self, name).await
    }

    async fn insert_vacancy(&self, vacancy: &NewVacancy) -> Result<(), AppError> {
        VacancyRepository::insert_vacancy(self, vacancy).await
    }

    async fn count_vacancies(&self) -> Result<i64, AppError> {
        VacancyRepository::count_vacancies(self).await
    }

    async fn get_companies_and_vacancies_count(
        &self,
    ) -> Result<Vec<CompanyVacancyCount>, AppError> {
        VacancyRepository::get_companies_and_vacancies_count(self).await
    }

    async fn get_all_vacancies(&self) -> Result<Vec<VacancyListing>, AppError> {
        VacancyRepository::get_all_vacancies(self).await
    }

    async fn get_avg_salary(&self) -> Result<Option<f64>, AppError> {
        VacancyRepository::get_avg_salary(self).await
    }

    async fn get_vacancies_with_higher_salary(&self) -> Result<Vec<Vacancy>, AppError> {
        VacancyRepository::get_vacancies_with_higher_salary(self).await
    }

    async fn get_vacancies_with_keyword(&self, keyword: &str) -> Result<Vec<Vacancy>, AppError> {
        VacancyRepository::get_vacancies_with_keyword(self, keyword).await
    }
}
