//! Statistics API endpoint

use axum::Extension;
use serde::Serialize;

use crate::statistics::Statistics;
use crate::statistics::StatisticsService;
use crate::storage::Storage;

use super::CurrentUser;
use super::Error;
use super::Success;

/// Statistics response going to the user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub stale_notes_count: usize,
    pub high_priority_notes_count: usize,
    pub average_completion_time_hours: f64,
    pub average_deletion_time_hours: f64,
}

impl StatisticsResponse {
    fn from_statistics(statistics: Statistics) -> Self {
        Self {
            stale_notes_count: statistics.stale_notes_count,
            high_priority_notes_count: statistics.high_priority_notes_count,
            average_completion_time_hours: statistics.average_completion_time_hours,
            average_deletion_time_hours: statistics.average_deletion_time_hours,
        }
    }
}

/// Statistics over the notes of the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:8080/api/statistics
/// ```
///
/// Response:
/// ```json
/// { "data": { "staleNotesCount": 2, "highPriorityNotesCount": 1, "averageCompletionTimeHours": 2.0, "averageDeletionTimeHours": 0.0 } }
/// ```
pub async fn summary<S: Storage>(
    Extension(statistics): Extension<StatisticsService<S>>,
    current_user: CurrentUser<S>,
) -> Result<Success<StatisticsResponse>, Error> {
    let statistics = statistics.summarize(&current_user.owner_id()).await?;

    Ok(Success::ok(StatisticsResponse::from_statistics(statistics)))
}
