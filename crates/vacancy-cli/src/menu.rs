//! Interactive query menu over a [`VacancyStore`].

use std::io::{BufRead, Write};

use anyhow::Result;
use vacancy_core::models::Vacancy;
use vacancy_core::traits::VacancyStore;

const NO_VACANCIES: &str = "No vacancies found.";

/// One entry of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Companies,
    AverageSalary,
    Keyword,
    AboveAverage,
    AllVacancies,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(Self::Companies),
            "2" => Some(Self::AverageSalary),
            "3" => Some(Self::Keyword),
            "4" => Some(Self::AboveAverage),
            "5" => Some(Self::AllVacancies),
            other if other.eq_ignore_ascii_case("exit") => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Run the menu until the user types `exit` or input ends.
///
/// Store errors are logged and shown as empty results; only I/O errors on
/// `input`/`out` end the loop early.
pub async fn run<S, R, W>(store: &S, mut input: R, mut out: W) -> Result<()>
where
    S: VacancyStore,
    R: BufRead,
    W: Write,
{
    loop {
        print_menu(&mut out)?;
        let Some(line) = prompt(&mut input, &mut out, "Choose an option (or 'exit' to quit): ")?
        else {
            break;
        };

        match MenuChoice::parse(&line) {
            Some(MenuChoice::Companies) => show_companies(store, &mut out).await?,
            Some(MenuChoice::AverageSalary) => show_average(store, &mut out).await?,
            Some(MenuChoice::Keyword) => {
                let Some(keyword) = prompt(&mut input, &mut out, "Enter a keyword: ")? else {
                    break;
                };
                show_keyword(store, &keyword, &mut out).await?;
            }
            Some(MenuChoice::AboveAverage) => show_above_average(store, &mut out).await?,
            Some(MenuChoice::AllVacancies) => show_all(store, &mut out).await?,
            Some(MenuChoice::Exit) => break,
            None => writeln!(out, "Invalid option, please try again.")?,
        }
    }

    Ok(())
}

fn print_menu(out: &mut impl Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "1. Companies and their vacancy counts")?;
    writeln!(out, "2. Average salary")?;
    writeln!(out, "3. Vacancies by keyword")?;
    writeln!(out, "4. Vacancies with above-average salary")?;
    writeln!(out, "5. All vacancies")?;
    Ok(())
}

/// Print `text`, read one line. `None` at end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, text: &str) -> Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

async fn show_companies(store: &impl VacancyStore, out: &mut impl Write) -> Result<()> {
    let companies = store
        .get_companies_and_vacancies_count()
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load companies");
            Vec::new()
        });

    if companies.is_empty() {
        writeln!(out, "No companies found.")?;
    }
    for company in companies {
        writeln!(
            out,
            "Company: {}, vacancies: {}",
            company.name, company.vacancies_count
        )?;
    }
    Ok(())
}

async fn show_average(store: &impl VacancyStore, out: &mut impl Write) -> Result<()> {
    let avg = store.get_avg_salary().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to compute average salary");
        None
    });

    match avg {
        Some(avg) => writeln!(out, "Average salary: {avg:.2}")?,
        None => writeln!(out, "Average salary: not available")?,
    }
    Ok(())
}

async fn show_keyword(
    store: &impl VacancyStore,
    keyword: &str,
    out: &mut impl Write,
) -> Result<()> {
    let vacancies = store
        .get_vacancies_with_keyword(keyword)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, keyword, "Keyword search failed");
            Vec::new()
        });

    write_vacancies(out, &vacancies, NO_VACANCIES)
}

async fn show_above_average(store: &impl VacancyStore, out: &mut impl Write) -> Result<()> {
    let vacancies = store
        .get_vacancies_with_higher_salary()
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to load above-average vacancies");
            Vec::new()
        });

    write_vacancies(
        out,
        &vacancies,
        "No vacancies with above-average salary found.",
    )
}

async fn show_all(store: &impl VacancyStore, out: &mut impl Write) -> Result<()> {
    let listings = store.get_all_vacancies().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load vacancies");
        Vec::new()
    });

    if listings.is_empty() {
        writeln!(out, "{NO_VACANCIES}")?;
    }
    for listing in listings {
        writeln!(
            out,
            "{} | {} | {} | {}",
            listing.company_name,
            listing.vacancy_title,
            salary(listing.salary_min),
            salary(listing.salary_max)
        )?;
    }
    Ok(())
}

fn write_vacancies(out: &mut impl Write, vacancies: &[Vacancy], empty: &str) -> Result<()> {
    if vacancies.is_empty() {
        writeln!(out, "{empty}")?;
    }
    for vacancy in vacancies {
        writeln!(
            out,
            "Vacancy: {}, min salary: {}, max salary: {}",
            vacancy.name,
            salary(vacancy.salary_min),
            salary(vacancy.salary_max)
        )?;
    }
    Ok(())
}

fn salary(value: Option<i32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
