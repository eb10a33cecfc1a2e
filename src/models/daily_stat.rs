use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub visitors: i64,
    pub whatsapp_clicks: i64,
}
