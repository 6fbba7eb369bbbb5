use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use utoipa::ToSchema;
use uuid::Uuid;

/// Recognized employment types. New kinds are added here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum EmploymentType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    #[serde(rename = "Contract")]
    Contract,
    #[serde(rename = "Internship")]
    Internship,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 4] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contract,
        EmploymentType::Internship,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "Full-time",
            EmploymentType::PartTime => "Part-time",
            EmploymentType::Contract => "Contract",
            EmploymentType::Internship => "Internship",
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unrecognized employment type `{}`", wanted))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub company: String,
    pub requirements: Vec<String>,
    pub view_count: i64,
    pub application_count: i64,
    pub posted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Job {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let employment_type: String = row.try_get("employment_type")?;
        let employment_type =
            employment_type
                .parse()
                .map_err(|e: String| sqlx::Error::ColumnDecode {
                    index: "employment_type".to_string(),
                    source: e.into(),
                })?;

        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            location: row.try_get("location")?,
            employment_type,
            company: row.try_get("company")?,
            requirements: row.try_get("requirements")?,
            view_count: row.try_get("view_count")?,
            application_count: row.try_get("application_count")?,
            posted_at: row.try_get("posted_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Administrator-editable content of a job. Counters and timestamps are
/// never part of it.
#[derive(Debug, Clone)]
pub struct JobFields {
    pub title: String,
    pub description: String,
    pub location: String,
    pub employment_type: EmploymentType,
    pub company: String,
    pub requirements: Vec<String>,
}

impl JobFields {
    /// Trims every text field and drops blank requirement lines.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.location = self.location.trim().to_string();
        self.company = self.company.trim().to_string();
        self.requirements = self
            .requirements
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }

    pub fn check(&self) -> crate::error::Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
            ("company", &self.company),
        ] {
            if value.trim().is_empty() {
                return Err(crate::error::Error::validation(
                    field,
                    format!("{} is required", field),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employment_type_parses_labels_case_insensitively() {
        assert_eq!("full-time".parse::<EmploymentType>(), Ok(EmploymentType::FullTime));
        assert_eq!("Internship".parse::<EmploymentType>(), Ok(EmploymentType::Internship));
        assert!("Freelance".parse::<EmploymentType>().is_err());
    }

    #[test]
    fn employment_type_serializes_as_label() {
        let json = serde_json::to_string(&EmploymentType::PartTime).unwrap();
        assert_eq!(json, "\"Part-time\"");
    }

    #[test]
    fn blank_title_is_field_tagged() {
        let fields = JobFields {
            title: "  ".into(),
            description: "d".into(),
            location: "l".into(),
            employment_type: EmploymentType::Contract,
            company: "c".into(),
            requirements: vec![],
        };
        match fields.check() {
            Err(crate::error::Error::Validation { field, .. }) => assert_eq!(field, "title"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
