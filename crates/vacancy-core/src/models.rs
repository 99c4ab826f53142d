use serde::{Deserialize, Deserializer, Serialize};

/// Employer record as returned by `GET /employers/{id}`.
///
/// Only the fields the ingestion needs are decoded; the rest of the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEmployer {
    /// External id. The API sends it as a string (`"1740"`).
    #[serde(deserialize_with = "employer_id")]
    pub id: u64,
    pub name: String,
}

/// One element of the `items` array of `GET /vacancies`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiVacancy {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub salary: Option<ApiSalary>,
}

/// Salary fork of a vacancy. Either bound may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSalary {
    #[serde(default)]
    pub from: Option<i32>,
    #[serde(default)]
    pub to: Option<i32>,
}

/// Body of `GET /vacancies?employer_id=...`.
///
/// Items are kept raw and decoded one by one in
/// [`into_items`](Self::into_items), so a single bad element does not
/// take the rest of the page with it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VacancyPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// A page element that did not decode as an [`ApiVacancy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedVacancy {
    /// The item's `name`, when it was at least a string.
    pub title: Option<String>,
    pub reason: String,
}

/// One element of a vacancy page after decoding.
pub type VacancyItem = Result<ApiVacancy, MalformedVacancy>;

impl VacancyPage {
    pub fn into_items(self) -> Vec<VacancyItem> {
        self.items
            .into_iter()
            .map(|item| {
                let title = item
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string);
                serde_json::from_value(item).map_err(|e| MalformedVacancy {
                    title,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

impl ApiVacancy {
    /// `(salary_min, salary_max)`, both absent when the vacancy has no salary.
    pub fn salary_bounds(&self) -> (Option<i32>, Option<i32>) {
        match &self.salary {
            Some(salary) => (salary.from, salary.to),
            None => (None, None),
        }
    }
}

/// DTO for inserting a new vacancy into the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVacancy {
    pub name: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub employer_id: i32,
}

/// A stored vacancy row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vacancy {
    pub id: i32,
    pub name: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub employer_id: Option<i32>,
}

impl Vacancy {
    pub fn midpoint(&self) -> Option<f64> {
        midpoint(self.salary_min, self.salary_max)
    }
}

/// Employer name with the number of vacancies it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyVacancyCount {
    pub name: String,
    pub vacancies_count: i64,
}

/// A vacancy joined to its employer's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VacancyListing {
    pub company_name: String,
    pub vacancy_title: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

/// `(min + max) / 2`, undefined unless both bounds are known.
pub fn midpoint(salary_min: Option<i32>, salary_max: Option<i32>) -> Option<f64> {
    match (salary_min, salary_max) {
        (Some(min), Some(max)) => Some((f64::from(min) + f64::from(max)) / 2.0),
        _ => None,
    }
}

fn employer_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
