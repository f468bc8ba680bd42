//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::{
    price::Price,
    types::{ExportStatus, JobState, JobType},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub submenus_count: i64,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmenuRecord {
    pub id: i64,
    pub menu_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub dishes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishRecord {
    pub id: i64,
    pub menu_id: i64,
    pub submenu_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: Option<Price>,
}

/// One dish joined with its submenu and menu, as fed to the spreadsheet export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub menu_title: String,
    pub menu_description: Option<String>,
    pub menu_dishes_count: i64,
    pub submenu_title: String,
    pub submenu_description: Option<String>,
    pub submenu_dishes_count: i64,
    pub dish_title: String,
    pub dish_description: Option<String>,
    pub dish_price: Option<Price>,
}

/// A row of the apalis queue, reduced to what export polling looks at.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub state: JobState,
    pub attempts: i32,
    pub max_attempts: i32,
    pub done_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
}

impl JobRecord {
    /// A failed job with attempts left goes back to the queue, so it is
    /// still reported as queued.
    pub fn export_status(&self) -> ExportStatus {
        match self.state {
            JobState::Failed if self.attempts < self.max_attempts => ExportStatus::Queued,
            state => ExportStatus::from(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(state: JobState, attempts: i32) -> JobRecord {
        JobRecord {
            id: "job".into(),
            job_type: JobType::RenderExport,
            payload: serde_json::Value::Null,
            state,
            attempts,
            max_attempts: 3,
            done_at: None,
            last_error: Some("boom".into()),
        }
    }

    #[test]
    fn failed_jobs_stay_queued_while_retries_remain() {
        assert_eq!(job(JobState::Failed, 1).export_status(), ExportStatus::Queued);
        assert_eq!(job(JobState::Failed, 2).export_status(), ExportStatus::Queued);
        assert_eq!(job(JobState::Failed, 3).export_status(), ExportStatus::Failed);
    }

    #[test]
    fn killed_jobs_fail_regardless_of_attempts() {
        assert_eq!(job(JobState::Killed, 0).export_status(), ExportStatus::Failed);
        assert_eq!(job(JobState::Done, 1).export_status(), ExportStatus::Succeeded);
    }
}
