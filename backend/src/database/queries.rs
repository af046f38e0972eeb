//! Note query engine
//!
//! Filtered and paginated listings plus the statistics shown on the
//! profile page. All counts run directly against the pool.

use super::models::*;
use crate::config::{
    DEFAULT_MOOD_LIMIT, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, SEARCHABLE_FIELDS, WEEKDAY_NAMES,
};
use crate::error::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct NoteQueryEngine {
    pool: SqlitePool,
}

impl NoteQueryEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List notes newest first, optionally filtered by keyword.
    ///
    /// `filter` is a comma separated list of fields to search. An empty
    /// filter searches every searchable field; names outside
    /// [`SEARCHABLE_FIELDS`] are ignored. Missing or non-positive `page` and
    /// `size` fall back to their defaults.
    pub async fn list_filtered(
        &self,
        keyword: &str,
        filter: &str,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Result<NotePage> {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let size = size.filter(|s| *s >= 1).unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(size);

        let fields = search_fields(keyword, filter);
        let pattern = like_pattern(keyword);

        let where_clause = if fields.is_empty() {
            String::new()
        } else {
            let conditions: Vec<String> = fields
                .iter()
                .map(|field| format!("{} LIKE ? ESCAPE '\\'", field))
                .collect();
            format!(" WHERE {}", conditions.join(" OR "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM notes{}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for _ in &fields {
            count_query = count_query.bind(&pattern);
        }
        // Count and page come from the same snapshot
        let mut tx = self.pool.begin().await?;
        let total = count_query.fetch_one(&mut *tx).await?;

        let page_sql = format!(
            "SELECT * FROM notes{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );
        let mut page_query = sqlx::query_as::<_, Note>(&page_sql);
        for _ in &fields {
            page_query = page_query.bind(&pattern);
        }
        let notes = page_query
            .bind(size)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(
            "Listed {} of {} notes (keyword: {:?}, fields: {:?}, page {}, size {})",
            notes.len(),
            total,
            keyword,
            fields,
            page,
            size
        );

        Ok(NotePage {
            page,
            size,
            total,
            notes,
        })
    }

    /// Notes created per weekday over the last complete Sunday to Saturday week
    pub async fn count_by_weekday(&self) -> Result<Vec<WeekdayCount>> {
        self.count_by_weekday_at(Utc::now().date_naive()).await
    }

    /// Same as [`count_by_weekday`](Self::count_by_weekday) with `today` as the reference date.
    ///
    /// The window is the Sunday to Saturday week before the one containing
    /// `today`, in UTC. All seven weekdays are always present, Sunday first.
    pub async fn count_by_weekday_at(&self, today: NaiveDate) -> Result<Vec<WeekdayCount>> {
        let (start, end) = previous_week(today);

        let created: Vec<DateTime<Utc>> =
            sqlx::query_scalar("SELECT created_at FROM notes WHERE created_at >= ? AND created_at < ?")
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?;

        let mut counts = [0i64; 7];
        for at in created {
            counts[at.weekday().num_days_from_sunday() as usize] += 1;
        }

        Ok(WEEKDAY_NAMES
            .iter()
            .zip(counts)
            .map(|(weekday, count)| WeekdayCount {
                weekday: weekday.to_string(),
                count,
            })
            .collect())
    }

    /// Most used moods, most frequent first
    pub async fn count_by_mood(&self, limit: Option<i64>) -> Result<Vec<MoodCount>> {
        let limit = limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_MOOD_LIMIT);

        let moods = sqlx::query_as::<_, MoodCount>(
            r#"
            SELECT mood, COUNT(*) AS count
            FROM notes
            GROUP BY mood
            ORDER BY count DESC, mood ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(moods)
    }

    /// Notes whose reminder is due at or before `until`, soonest first
    pub async fn list_due_reminders(&self, until: DateTime<Utc>) -> Result<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT * FROM notes
            WHERE reminder_at IS NOT NULL AND reminder_at <= ?
            ORDER BY reminder_at ASC
            "#,
        )
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }
}

/// Columns a keyword applies to
fn search_fields(keyword: &str, filter: &str) -> Vec<&'static str> {
    if keyword.is_empty() {
        return Vec::new();
    }
    if filter.trim().is_empty() {
        return SEARCHABLE_FIELDS.to_vec();
    }

    let requested: Vec<&str> = filter.split(',').map(str::trim).collect();
    SEARCHABLE_FIELDS
        .iter()
        .copied()
        .filter(|field| requested.contains(field))
        .collect()
}

/// Substring pattern for `LIKE ... ESCAPE '\'` matching `keyword` literally
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `[start, end)` of the Sunday to Saturday week before the one holding `today`.
///
/// Only completed weeks count: on a Saturday the current week is still open,
/// so the window is the week before it, ending at the preceding Sunday 00:00.
fn previous_week(today: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let this_sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    let start = this_sunday - Duration::days(7);
    (midnight(start), midnight(this_sunday))
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}
