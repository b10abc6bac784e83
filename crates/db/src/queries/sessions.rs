//! Session loading with student-email denormalization (§3 I1, §4.3 step 4,
//! §4.5 Session handlers).

use chrono::NaiveDate;
use sqlx::PgPool;
use warden_core::Session;

use crate::error::DbResult;
use crate::rows::SessionRow;

const COLUMNS: &str = "sessions.id, sessions.title, sessions.start_time, sessions.end_time, \
     sessions.student_id, students.feide_email AS student_email, sessions.class_id, \
     sessions.teacher_id, sessions.school_id, sessions.teacher_session_id, sessions.grade, \
     sessions.profile_id, sessions.is_active, sessions.percentage";

fn row_to_session(row: SessionRow) -> Session {
    Session {
        id: row.id,
        title: row.title,
        start_time: row.start_time,
        end_time: row.end_time,
        student_id: row.student_id,
        student_email: row.student_email,
        class_id: row.class_id,
        teacher_id: row.teacher_id,
        school_id: row.school_id,
        teacher_session_id: row.teacher_session_id,
        grade: row.grade,
        profile_id: row.profile_id,
        is_active: row.is_active,
        percentage: row.percentage,
    }
}

/// Sessions whose `start_time` falls within `[window_start, window_end]`
/// (§4.3 step 4, the loader's forward window).
pub async fn fetch_in_window(
    pool: &PgPool,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> DbResult<Vec<Session>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM sessions \
         LEFT JOIN students ON students.id = sessions.student_id \
         WHERE sessions.start_time::date BETWEEN $1 AND $2"
    );
    let rows: Vec<SessionRow> = sqlx::query_as(&sql)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(row_to_session).collect())
}

/// Re-fetch one session by id, respecting the forward window (§4.5 Session
/// INSERT/UPDATE: "re-fetch (respecting the forward window)").
pub async fn fetch_one_in_window(
    pool: &PgPool,
    id: i64,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> DbResult<Option<Session>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM sessions \
         LEFT JOIN students ON students.id = sessions.student_id \
         WHERE sessions.id = $1 AND sessions.start_time::date BETWEEN $2 AND $3"
    );
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(window_start)
        .bind(window_end)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(row_to_session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn row_to_session_carries_the_denormalized_email_through() {
        let now = Utc::now();
        let row = SessionRow {
            id: 1,
            title: "math".into(),
            start_time: now,
            end_time: now,
            student_id: 9001,
            student_email: Some("s@test".into()),
            class_id: Some(5),
            teacher_id: Some(500),
            school_id: 1,
            teacher_session_id: None,
            grade: Some("9".into()),
            profile_id: Some(1),
            is_active: None,
            percentage: None,
        };
        let session = row_to_session(row);
        assert_eq!(session.student_email, Some("s@test".into()));
        assert_eq!(session.class_id, Some(5));
    }

    #[test]
    fn row_to_session_tolerates_a_missing_email() {
        let now = Utc::now();
        let row = SessionRow {
            id: 2,
            title: "math".into(),
            start_time: now,
            end_time: now,
            student_id: 9002,
            student_email: None,
            class_id: None,
            teacher_id: None,
            school_id: 1,
            teacher_session_id: None,
            grade: None,
            profile_id: None,
            is_active: None,
            percentage: None,
        };
        assert_eq!(row_to_session(row).student_email, None);
    }
}
