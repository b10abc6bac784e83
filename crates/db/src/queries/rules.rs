use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use warden_core::rule::coerce_scope_value;
use warden_core::{Rule, Scope};

use crate::error::{DbError, DbResult};
use crate::rows::RuleRow;

fn parse_scope(raw: &str) -> DbResult<Scope> {
    match raw {
        "student" => Ok(Scope::Student),
        "school" => Ok(Scope::School),
        "grade" => Ok(Scope::Grade),
        "class" => Ok(Scope::Class),
        other => Err(DbError::InvalidPayload(format!("unknown rule scope: {other}"))),
    }
}

fn row_to_rule(row: RuleRow) -> DbResult<Rule> {
    Ok(Rule {
        id: row.id,
        scope: parse_scope(&row.scope)?,
        scope_value: coerce_scope_value(row.scope_value.as_deref()),
        start_time: row.start_time,
        end_time: row.end_time,
        profile_id: row.profile_id,
    })
}

/// Rules whose active window intersects `[window_start, window_end]`
/// (§4.3 step 3, the loader's forward window).
pub async fn fetch_in_window(
    pool: &PgPool,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> DbResult<Vec<Rule>> {
    let rows: Vec<RuleRow> = sqlx::query_as(
        "SELECT id, scope, scope_value, start_time, end_time, profile_id \
         FROM rules \
         WHERE start_time::date <= $2 AND end_time::date >= $1",
    )
    .bind(window_start)
    .bind(window_end)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_rule).collect()
}

/// Re-fetch one rule by id, dropped if it now falls outside the forward
/// window (§4.5 Rule INSERT/UPDATE: "re-fetch by id, respecting the forward
/// window filter").
pub async fn fetch_one_in_window(
    pool: &PgPool,
    id: i64,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> DbResult<Option<Rule>> {
    let row: Option<RuleRow> = sqlx::query_as(
        "SELECT id, scope, scope_value, start_time, end_time, profile_id \
         FROM rules \
         WHERE id = $1 AND start_time::date <= $3 AND end_time::date >= $2",
    )
    .bind(id)
    .bind(window_start)
    .bind(window_end)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_rule).transpose()
}
