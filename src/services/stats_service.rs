// src/services/stats_service.rs
// Agregações de presenças. Sem cache: cada chamada relê o estado atual.
use crate::{
    error::AppResult,
    models::{
        stats::{ratio, ClassStats, GlobalStats, RoomStats, TeacherStats, TeacherSummary},
        user::Caller,
    },
};
use chrono::{Duration, Local, NaiveDate};
use sqlx::SqlitePool;

/// Janela do resumo do professor ("presenças recentes").
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Estatísticas globais: totais, rácio e detalhe por turma.
pub async fn global_stats(db_pool: &SqlitePool) -> AppResult<GlobalStats> {
    let (total_presences, total_absences): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(status = 'present'), 0),
               COALESCE(SUM(status = 'absent'), 0)
        FROM presences
        "#,
    )
    .fetch_one(db_pool)
    .await?;

    let by_room = sqlx::query_as::<_, RoomStats>(
        r#"
        SELECT c.id AS class_id, c.name AS room,
               COALESCE(SUM(p.status = 'present'), 0) AS presences,
               COALESCE(SUM(p.status = 'absent'), 0) AS absences
        FROM classes c
        LEFT JOIN students s ON s.class_id = c.id
        LEFT JOIN presences p ON p.student_id = s.id
        GROUP BY c.id, c.name
        ORDER BY c.name ASC, c.id ASC
        "#,
    )
    .fetch_all(db_pool)
    .await?;

    tracing::debug!(
        "Stats globais: {} presentes, {} ausentes, {} turmas",
        total_presences,
        total_absences,
        by_room.len()
    );
    Ok(GlobalStats {
        total_presences,
        total_absences,
        presence_ratio: ratio(total_presences, total_absences),
        by_room,
    })
}

/// Estatísticas restritas às turmas do professor. Sem turmas = tudo a zero.
pub async fn teacher_stats(db_pool: &SqlitePool, caller: &Caller) -> AppResult<TeacherStats> {
    let rooms = sqlx::query_as::<_, RoomStats>(
        r#"
        SELECT c.id AS class_id, c.name AS room,
               COALESCE(SUM(p.status = 'present'), 0) AS presences,
               COALESCE(SUM(p.status = 'absent'), 0) AS absences
        FROM class_teacher ct
        JOIN classes c ON c.id = ct.class_id
        LEFT JOIN students s ON s.class_id = c.id
        LEFT JOIN presences p ON p.student_id = s.id
        WHERE ct.teacher_id = ?1
        GROUP BY c.id, c.name
        ORDER BY c.name ASC, c.id ASC
        "#,
    )
    .bind(caller.id)
    .fetch_all(db_pool)
    .await?;

    tracing::debug!("Stats do professor {}: {} turma(s)", caller.id, rooms.len());
    Ok(TeacherStats::rollup(rooms.into_iter().map(ClassStats::from).collect()))
}

/// Resumo do professor: turmas, alunos nessas turmas e registos dos últimos dias.
pub async fn teacher_summary(db_pool: &SqlitePool, caller: &Caller) -> AppResult<TeacherSummary> {
    let today = Local::now().date_naive();
    teacher_summary_at(db_pool, caller, today).await
}

pub async fn teacher_summary_at(db_pool: &SqlitePool, caller: &Caller, today: NaiveDate) -> AppResult<TeacherSummary> {
    let since = today - Duration::days(RECENT_WINDOW_DAYS);

    let (classes, students, recent_presences): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM class_teacher WHERE teacher_id = ?1),
            (SELECT COUNT(*) FROM students s
               JOIN class_teacher ct ON ct.class_id = s.class_id
              WHERE ct.teacher_id = ?1),
            (SELECT COUNT(*) FROM presences p
               JOIN students s ON s.id = p.student_id
               JOIN class_teacher ct ON ct.class_id = s.class_id
              WHERE ct.teacher_id = ?1 AND p.date >= ?2)
        "#,
    )
    .bind(caller.id)
    .bind(since)
    .fetch_one(db_pool)
    .await?;

    Ok(TeacherSummary {
        classes,
        students,
        recent_presences,
    })
}
