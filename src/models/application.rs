use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use utoipa::ToSchema;
use uuid::Uuid;

/// Review status of an application.
///
/// Any status may be set from any other through an administrative
/// transition, including moves out of `hired` and `rejected`, so reviewers
/// can correct mistakes. `Pending` is only ever assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Hired => "hired",
        }
    }

    /// Always true. Kept as a named rule so the permissive lifecycle is an
    /// explicit, tested property rather than a missing check.
    pub fn can_transition_to(&self, _next: ApplicationStatus) -> bool {
        true
    }

    pub fn title_case(&self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unrecognized status `{}`", wanted))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: Option<String>,
    pub resume_url: String,
    pub resume_artifact_id: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Application {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl<'r> FromRow<'r, PgRow> for Application {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse()
            .map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            job_id: row.try_get("job_id")?,
            applicant_id: row.try_get("applicant_id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            cover_letter: row.try_get("cover_letter")?,
            resume_url: row.try_get("resume_url")?,
            resume_artifact_id: row.try_get("resume_artifact_id")?,
            status,
            submitted_at: row.try_get("submitted_at")?,
            reviewed_at: row.try_get("reviewed_at")?,
            notes: row.try_get("notes")?,
        })
    }
}

/// Everything the submission protocol hands to the repository for insert.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub applicant_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub cover_letter: Option<String>,
    pub resume_url: String,
    pub resume_artifact_id: Option<String>,
}

/// AND-combined optional filters for the admin listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub job_id: Option<Uuid>,
    /// Case-insensitive substring over first name, last name and email.
    pub search: Option<String>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        if let Some(status) = self.status {
            if application.status != status {
                return false;
            }
        }
        if let Some(job_id) = self.job_id {
            if application.job_id != job_id {
                return false;
            }
        }
        if let Some(needle) = self.search.as_deref() {
            let needle = needle.to_lowercase();
            let hit = [
                &application.first_name,
                &application.last_name,
                &application.email,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: i64 = 10;
    pub const MAX_PAGE_SIZE: i64 = 100;

    /// Clamps page to at least 1 and page size into `1..=max_page_size`.
    pub fn new(page: Option<i64>, page_size: Option<i64>, max_page_size: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(Self::DEFAULT_PAGE_SIZE)
                .clamp(1, max_page_size.max(1)),
        }
    }

    /// Saturates for pages far past the end; those read as empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.page_size - 1) / self.page_size
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None, Self::MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone)]
pub struct ApplicationPage {
    pub items: Vec<Application>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_can_reach_every_other() {
        for from in ApplicationStatus::ALL {
            for to in ApplicationStatus::ALL {
                assert!(from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("archived".parse::<ApplicationStatus>().is_err());
        assert_eq!("Shortlisted".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Shortlisted));
    }

    #[test]
    fn title_case_capitalizes_first_letter() {
        assert_eq!(ApplicationStatus::Shortlisted.title_case(), "Shortlisted");
    }

    #[test]
    fn total_pages_is_ceiling() {
        let p = Pagination::new(Some(1), Some(10), 100);
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(25), 3);
        assert_eq!(Pagination::new(Some(3), Some(10), 100).offset(), 20);
    }

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(Pagination::new(Some(0), Some(5000), 100).page_size, 100);
        assert_eq!(Pagination::new(Some(0), Some(0), 100).page, 1);
        assert_eq!(Pagination::new(None, Some(0), 100).page_size, 1);
    }

    #[test]
    fn offset_saturates_on_huge_page() {
        let p = Pagination::new(Some(i64::MAX), Some(100), 100);
        assert_eq!(p.offset(), i64::MAX);
        assert_eq!(p.total_pages(25), 1);
    }
}
