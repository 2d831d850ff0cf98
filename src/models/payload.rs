use serde::{Deserialize, Serialize};

use crate::models::common::Source;
use crate::models::reservation::VisitType;

/// Document POSTed to the reservation webhook.
///
/// All timestamps are rendered as `YYYY-MM-DDTHH:MM:SS+09:00`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPayload {
    pub user_id: String,
    pub source: Source,
    pub menu_id: String,
    pub menu_name: String,
    pub visit_type: VisitType,
    pub start_date_time: String,
    pub end_date_time: String,
    pub duration_min: u32,
    pub customer_name: String,
    pub phone: String,
    pub symptom_note: String,
    pub memo: String,
    pub client_timestamp: String,
}
