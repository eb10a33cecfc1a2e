use crate::error::Result;
use crate::models::daily_stat::DailyStat;
use crate::utils::time::today;
use chrono::{Duration, NaiveDate};
use sqlx::PgPool;

/// Daily visitor / WhatsApp-click counters. Increments are atomic upserts,
/// so concurrent page loads cannot lose a count.
#[derive(Clone)]
pub struct AnalyticsService {
    pool: PgPool,
}

pub struct TotalStats {
    pub total_visitors: i64,
    pub total_clicks: i64,
}

impl AnalyticsService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn track_visitor(&self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics (date, visitors, whatsapp_clicks)
            VALUES ($1, 1, 0)
            ON CONFLICT (date)
            DO UPDATE SET visitors = analytics.visitors + 1
            "#,
        )
        .bind(today())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn track_whatsapp_click(&self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics (date, visitors, whatsapp_clicks)
            VALUES ($1, 0, 1)
            ON CONFLICT (date)
            DO UPDATE SET whatsapp_clicks = analytics.whatsapp_clicks + 1
            "#,
        )
        .bind(today())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Last seven days, oldest first, zero-filled for days with no row.
    pub async fn weekly_stats(&self) -> Result<Vec<DailyStat>> {
        let dates = week_window(today());

        let rows = sqlx::query_as::<_, DailyStat>(
            r#"
            SELECT date, visitors, whatsapp_clicks
            FROM analytics
            WHERE date = ANY($1)
            "#,
        )
        .bind(&dates)
        .fetch_all(&self.pool)
        .await?;

        Ok(zero_fill(dates, rows))
    }

    pub async fn total_stats(&self) -> Result<TotalStats> {
        let (total_visitors, total_clicks) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COALESCE(SUM(visitors), 0)::BIGINT,
                COALESCE(SUM(whatsapp_clicks), 0)::BIGINT
            FROM analytics
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TotalStats {
            total_visitors,
            total_clicks,
        })
    }
}

/// The seven calendar days ending at `end`, oldest first.
fn week_window(end: NaiveDate) -> Vec<NaiveDate> {
    (0..7).rev().map(|i| end - Duration::days(i)).collect()
}

/// Aligns sparse rows to the window: one entry per date, in window order,
/// with an all-zero stat for dates the query returned no row for.
fn zero_fill(dates: Vec<NaiveDate>, rows: Vec<DailyStat>) -> Vec<DailyStat> {
    dates
        .into_iter()
        .map(|date| {
            rows.iter()
                .find(|row| row.date == date)
                .cloned()
                .unwrap_or(DailyStat {
                    date,
                    visitors: 0,
                    whatsapp_clicks: 0,
                })
        })
        .collect()
}
