use sqlx::PgPool;
use warden_core::Student;

use crate::error::DbResult;
use crate::rows::StudentRow;

/// Load every student for the initial bulk load (§4.3 step 1).
///
/// Students with a null `feide_email` are filtered out here rather than by
/// the caller — §3: "Present in cache only if `email` is non-null."
pub async fn fetch_all(pool: &PgPool) -> DbResult<Vec<Student>> {
    let rows: Vec<StudentRow> = sqlx::query_as(
        "SELECT id, feide_email, school_id, grade, class_id FROM students",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(row_to_student).collect())
}

/// Re-fetch one student by id (§4.5 Student INSERT/UPDATE). `Ok(None)` means
/// either the row is gone or its email is null — both cases mean "not in
/// cache" to the caller.
pub async fn fetch_one(pool: &PgPool, id: i64) -> DbResult<Option<Student>> {
    let row: Option<StudentRow> = sqlx::query_as(
        "SELECT id, feide_email, school_id, grade, class_id FROM students WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(row_to_student))
}

fn row_to_student(row: StudentRow) -> Option<Student> {
    let email = row.feide_email?;
    Some(Student::new(row.id, email, row.school_id, row.grade, row.class_id))
}
