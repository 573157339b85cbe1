// src/services/presence_service.rs
use crate::{
    error::{is_unique_violation, AppError, AppResult, FieldErrors},
    models::{
        presence::{Presence, PresenceFilter, PresenceInput},
        user::{Caller, Role},
    },
    services::{class_teacher_service, classe_service, notification_service, student_service},
};
use chrono::NaiveDate;
use sqlx::{SqliteExecutor, SqlitePool};

const DUPLICATE_PRESENCE: &str = "Presença já registada para este aluno nesta data.";

const PRESENCE_SELECT: &str = r#"
    SELECT p.id, p.student_id, p.date, p.status,
           s.first_name, s.last_name, s.matricule, u.email,
           s.class_id, c.name AS class_name
    FROM presences p
    JOIN students s ON s.id = p.student_id
    LEFT JOIN users u ON u.id = s.user_id
    LEFT JOIN classes c ON c.id = s.class_id
"#;

/// Lista as presenças (admin), com filtros opcionais.
pub async fn list_presences(db_pool: &SqlitePool, filter: &PresenceFilter) -> AppResult<Vec<Presence>> {
    tracing::debug!("Buscando presenças com filtro {:?}", filter);
    let presences = sqlx::query_as::<_, Presence>(&format!(
        r#"{}
        WHERE (?1 IS NULL OR s.class_id = ?1)
          AND (?2 IS NULL OR p.date = ?2)
          AND (?3 IS NULL OR p.student_id = ?3)
        ORDER BY p.date DESC, p.id DESC"#,
        PRESENCE_SELECT
    ))
    .bind(filter.class_id)
    .bind(filter.date)
    .bind(filter.student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(presences)
}

pub async fn find_presence<'e>(executor: impl SqliteExecutor<'e>, presence_id: i64) -> AppResult<Option<Presence>> {
    let presence = sqlx::query_as::<_, Presence>(&format!("{} WHERE p.id = ?1", PRESENCE_SELECT))
        .bind(presence_id)
        .fetch_optional(executor)
        .await?;
    Ok(presence)
}

pub async fn get_presence(db_pool: &SqlitePool, presence_id: i64) -> AppResult<Presence> {
    find_presence(db_pool, presence_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Presença não encontrada.".to_string()))
}

/// Marca uma presença. Admin em qualquer turma; professor só nas turmas a que
/// está associado. Quando não é um admin a escrever, os admins são notificados.
pub async fn mark_presence(db_pool: &SqlitePool, caller: &Caller, input: &PresenceInput) -> AppResult<Presence> {
    tracing::debug!(
        "Marcando presença: aluno {} em {} = {} (por {})",
        input.student_id,
        input.date,
        input.status,
        caller.id
    );

    let Some(student) = student_service::find_student(db_pool, input.student_id).await? else {
        return Err(AppError::Validation(FieldErrors::single(
            "student_id",
            "O aluno selecionado não existe.",
        )));
    };
    let (Some(class_id), Some(class_name)) = (student.class_id, student.class_name.clone()) else {
        return Err(AppError::Validation(FieldErrors::single(
            "student_id",
            "O aluno não está atribuído a nenhuma turma.",
        )));
    };

    let allowed = match caller.role {
        Role::Admin => true,
        Role::Teacher => class_teacher_service::is_teacher_of(db_pool, caller.id, class_id).await?,
        Role::Student => false,
    };
    if !allowed {
        tracing::warn!(
            "User {} ({}) sem permissão para marcar presenças na turma {}",
            caller.id,
            caller.role,
            class_id
        );
        return Err(AppError::Forbidden(
            "Tem de ser admin ou professor associado a esta turma.".to_string(),
        ));
    }

    let mut tx = db_pool.begin().await?;

    // A unicidade (aluno, data) é garantida pelo índice único
    let insert = sqlx::query("INSERT INTO presences (student_id, date, status) VALUES (?1, ?2, ?3)")
        .bind(input.student_id)
        .bind(input.date)
        .bind(input.status)
        .execute(&mut *tx)
        .await;
    let id = match insert {
        Ok(result) => result.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Presença duplicada: aluno {} em {}", input.student_id, input.date);
            tx.rollback().await?;
            return Err(AppError::Conflict(DUPLICATE_PRESENCE.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if !caller.is_admin() {
        let message = notification_service::presence_message(&student.full_name(), &class_name, input.date);
        notification_service::notify_admins(&mut *tx, &message).await?;
    }

    let presence = find_presence(&mut *tx, id)
        .await?
        .ok_or(AppError::InternalServerError)?;
    tx.commit().await?;

    tracing::info!("✅ Presença {} registada ({}).", id, presence.status);
    Ok(presence)
}

/// Atualização (admin). Mudar para um (aluno, data) já ocupado é um conflito.
pub async fn update_presence(db_pool: &SqlitePool, presence_id: i64, input: &PresenceInput) -> AppResult<Presence> {
    get_presence(db_pool, presence_id).await?;
    if student_service::find_student(db_pool, input.student_id).await?.is_none() {
        return Err(AppError::Validation(FieldErrors::single(
            "student_id",
            "O aluno selecionado não existe.",
        )));
    }

    let update = sqlx::query("UPDATE presences SET student_id = ?1, date = ?2, status = ?3 WHERE id = ?4")
        .bind(input.student_id)
        .bind(input.date)
        .bind(input.status)
        .bind(presence_id)
        .execute(db_pool)
        .await;
    match update {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(AppError::Conflict(DUPLICATE_PRESENCE.to_string())),
        Err(e) => return Err(e.into()),
    }

    tracing::info!("✅ Presença {} atualizada.", presence_id);
    get_presence(db_pool, presence_id).await
}

pub async fn delete_presence(db_pool: &SqlitePool, presence_id: i64) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM presences WHERE id = ?1")
        .bind(presence_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::NotFound("Presença não encontrada.".to_string()));
    }
    tracing::info!("Presença {} apagada.", presence_id);
    Ok(())
}

/// Presenças de uma turma, opcionalmente num só dia.
pub async fn class_presences(
    db_pool: &SqlitePool,
    caller: &Caller,
    class_id: i64,
    date: Option<NaiveDate>,
) -> AppResult<Vec<Presence>> {
    classe_service::get_classe(db_pool, class_id).await?;
    classe_service::ensure_class_scope(db_pool, caller, class_id).await?;
    list_presences(
        db_pool,
        &PresenceFilter {
            class_id: Some(class_id),
            date,
            student_id: None,
        },
    )
    .await
}

/// Presenças do aluno autenticado.
pub async fn my_presences(db_pool: &SqlitePool, caller: &Caller) -> AppResult<Vec<Presence>> {
    let student = student_service::my_profile(db_pool, caller).await?;
    list_presences(
        db_pool,
        &PresenceFilter {
            class_id: None,
            date: None,
            student_id: Some(student.id),
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::create_test_pool,
        models::{
            class_teacher::ClassTeacherInput,
            classe::ClasseInput,
            presence::PresenceStatus,
            student::EnrollPayload,
        },
        services::user_service,
    };

    struct Fixture {
        admin: Caller,
        teacher: Caller,
        outsider: Caller,
        class_id: i64,
        student_id: i64,
    }

    async fn caller(pool: &SqlitePool, name: &str, email: &str, role: Role) -> Caller {
        let user = user_service::create_user(pool, name, email, "pass", role).await.unwrap();
        Caller { id: user.id, name: user.name, email: user.email, role }
    }

    async fn fixture(pool: &SqlitePool) -> Fixture {
        let admin = caller(pool, "Admin", "admin@iut.fr", Role::Admin).await;
        let teacher = caller(pool, "Prof", "prof@iut.fr", Role::Teacher).await;
        let outsider = caller(pool, "Outro", "outro@iut.fr", Role::Teacher).await;
        let learner = caller(pool, "Léa", "lea@iut.fr", Role::Student).await;

        let classe = classe_service::create_classe(pool, &ClasseInput { name: "GEII-1".into(), description: None })
            .await
            .unwrap();
        class_teacher_service::create_link(pool, &ClassTeacherInput { class_id: classe.id, teacher_id: teacher.id })
            .await
            .unwrap();
        let student = student_service::enroll(
            pool,
            &learner,
            &EnrollPayload {
                class_id: Some(classe.id),
                first_name: Some("Léa".into()),
                last_name: Some("Martin".into()),
            },
        )
        .await
        .unwrap();

        Fixture { admin, teacher, outsider, class_id: classe.id, student_id: student.id }
    }

    fn input(student_id: i64, day: u32, status: PresenceStatus) -> PresenceInput {
        PresenceInput {
            student_id,
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            status,
        }
    }

    #[tokio::test]
    async fn duplicate_day_is_a_conflict() {
        let pool = create_test_pool().await;
        let f = fixture(&pool).await;
        let first = input(f.student_id, 10, PresenceStatus::Present);

        let created = mark_presence(&pool, &f.admin, &first).await.unwrap();
        assert_eq!(created.class_name.as_deref(), Some("GEII-1"));
        assert!(matches!(
            mark_presence(&pool, &f.admin, &input(f.student_id, 10, PresenceStatus::Absent)).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(list_presences(&pool, &PresenceFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn teacher_write_notifies_admins_but_admin_write_does_not() {
        let pool = create_test_pool().await;
        let f = fixture(&pool).await;

        mark_presence(&pool, &f.admin, &input(f.student_id, 1, PresenceStatus::Present)).await.unwrap();
        assert!(notification_service::list_for(&pool, &f.admin).await.unwrap().is_empty());

        mark_presence(&pool, &f.teacher, &input(f.student_id, 2, PresenceStatus::Absent)).await.unwrap();
        let notes = notification_service::list_for(&pool, &f.admin).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("Léa Martin"));
        assert!(notes[0].message.contains("GEII-1"));
        assert!(notes[0].message.contains("2025-03-02"));
    }

    #[tokio::test]
    async fn unassigned_teacher_is_forbidden() {
        let pool = create_test_pool().await;
        let f = fixture(&pool).await;
        assert!(matches!(
            mark_presence(&pool, &f.outsider, &input(f.student_id, 3, PresenceStatus::Present)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            class_presences(&pool, &f.outsider, f.class_id, None).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn student_without_class_cannot_be_marked() {
        let pool = create_test_pool().await;
        let f = fixture(&pool).await;
        student_service::assign_class(&pool, f.student_id, None).await.unwrap();
        match mark_presence(&pool, &f.admin, &input(f.student_id, 4, PresenceStatus::Present)).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("student_id")),
            other => panic!("esperava validação, obtive {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_into_taken_day_is_a_conflict() {
        let pool = create_test_pool().await;
        let f = fixture(&pool).await;
        mark_presence(&pool, &f.admin, &input(f.student_id, 5, PresenceStatus::Present)).await.unwrap();
        let other = mark_presence(&pool, &f.admin, &input(f.student_id, 6, PresenceStatus::Present))
            .await
            .unwrap();

        assert!(matches!(
            update_presence(&pool, other.id, &input(f.student_id, 5, PresenceStatus::Absent)).await,
            Err(AppError::Conflict(_))
        ));
        let updated = update_presence(&pool, other.id, &input(f.student_id, 6, PresenceStatus::Absent))
            .await
            .unwrap();
        assert_eq!(updated.status, PresenceStatus::Absent);
    }

    #[tokio::test]
    async fn date_filter_and_class_listing() {
        let pool = create_test_pool().await;
        let f = fixture(&pool).await;
        mark_presence(&pool, &f.teacher, &input(f.student_id, 7, PresenceStatus::Present)).await.unwrap();
        mark_presence(&pool, &f.teacher, &input(f.student_id, 8, PresenceStatus::Absent)).await.unwrap();

        let all = class_presences(&pool, &f.teacher, f.class_id, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());

        let one_day = class_presences(&pool, &f.teacher, f.class_id, NaiveDate::from_ymd_opt(2025, 3, 7))
            .await
            .unwrap();
        assert_eq!(one_day.len(), 1);
        assert_eq!(one_day[0].status, PresenceStatus::Present);
    }
}
