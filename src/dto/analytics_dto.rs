use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::daily_stat::DailyStat;
use crate::services::analytics_service::TotalStats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStatResponse {
    pub date: NaiveDate,
    pub visitors: i64,
    pub whatsapp_clicks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyStatsResponse {
    pub items: Vec<DailyStatResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalStatsResponse {
    pub total_visitors: i64,
    pub total_clicks: i64,
}

impl From<DailyStat> for DailyStatResponse {
    fn from(value: DailyStat) -> Self {
        Self {
            date: value.date,
            visitors: value.visitors,
            whatsapp_clicks: value.whatsapp_clicks,
        }
    }
}

impl From<TotalStats> for TotalStatsResponse {
    fn from(value: TotalStats) -> Self {
        Self {
            total_visitors: value.total_visitors,
            total_clicks: value.total_clicks,
        }
    }
}
