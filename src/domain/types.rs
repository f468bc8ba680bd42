use std::fmt;

use serde::{Deserialize, Serialize};

/// The three levels of the catalog hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Menu,
    Submenu,
    Dish,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Menu => "menu",
            EntityKind::Submenu => "submenu",
            EntityKind::Dish => "dish",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Scheduled,
    Running,
    Done,
    Failed,
    Killed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "Pending",
            JobState::Scheduled => "Scheduled",
            JobState::Running => "Running",
            JobState::Done => "Done",
            JobState::Failed => "Failed",
            JobState::Killed => "Killed",
        }
    }
}

impl TryFrom<&str> for JobState {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Pending" | "Latest" => Ok(JobState::Pending),
            "Scheduled" => Ok(JobState::Scheduled),
            "Running" => Ok(JobState::Running),
            "Done" => Ok(JobState::Done),
            "Failed" => Ok(JobState::Failed),
            "Killed" => Ok(JobState::Killed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    RenderExport,
}

impl JobType {
    pub fn as_str(self) -> &'static str {
        match self {
            JobType::RenderExport => "render_export",
        }
    }
}

impl TryFrom<&str> for JobType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "render_export" => Ok(JobType::RenderExport),
            _ => Err(()),
        }
    }
}

/// Client-facing lifecycle of an export request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportStatus {
    Requested,
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl ExportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportStatus::Requested => "Requested",
            ExportStatus::Queued => "Queued",
            ExportStatus::Running => "Running",
            ExportStatus::Succeeded => "Succeeded",
            ExportStatus::Failed => "Failed",
        }
    }
}

impl From<JobState> for ExportStatus {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Pending | JobState::Scheduled => ExportStatus::Queued,
            JobState::Running => ExportStatus::Running,
            JobState::Done => ExportStatus::Succeeded,
            JobState::Failed | JobState::Killed => ExportStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apalis_states_map_onto_export_lifecycle() {
        let cases = [
            ("Pending", ExportStatus::Queued),
            ("Latest", ExportStatus::Queued),
            ("Scheduled", ExportStatus::Queued),
            ("Running", ExportStatus::Running),
            ("Done", ExportStatus::Succeeded),
            ("Failed", ExportStatus::Failed),
            ("Killed", ExportStatus::Failed),
        ];
        for (raw, expected) in cases {
            let state = JobState::try_from(raw).expect("known state");
            assert_eq!(ExportStatus::from(state), expected, "state {raw}");
        }
        assert!(JobState::try_from("Unknown").is_err());
    }

    #[test]
    fn entity_kinds_display_lowercase() {
        assert_eq!(EntityKind::Submenu.to_string(), "submenu");
        assert_eq!(EntityKind::Dish.as_str(), "dish");
    }
}
