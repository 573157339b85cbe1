// src/services/student_service.rs
use crate::{
    error::{is_unique_violation, AppError, AppResult, FieldErrors},
    models::{
        student::{format_matricule, EnrollPayload, Student, StudentFilter, StudentInput},
        user::{Caller, Role},
    },
    services::{classe_service, user_service},
};
use sqlx::{SqliteExecutor, SqlitePool};

const ALREADY_ENROLLED: &str = "Este utilizador já está inscrito como aluno.";

const STUDENT_SELECT: &str = r#"
    SELECT s.id, s.user_id, s.class_id, s.first_name, s.last_name, s.matricule,
           c.name AS class_name, u.name AS user_name, u.email
    FROM students s
    JOIN users u ON u.id = s.user_id
    LEFT JOIN classes c ON c.id = s.class_id
"#;

// `%` e `_` escritos pelo utilizador são literais
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lista os alunos, com filtro opcional por turma e pesquisa por nome/matrícula.
pub async fn list_students(db_pool: &SqlitePool, filter: &StudentFilter) -> AppResult<Vec<Student>> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));
    tracing::debug!("Buscando alunos (turma={:?}, pesquisa={:?})", filter.class_id, search);

    let students = sqlx::query_as::<_, Student>(&format!(
        r#"{}
        WHERE (?1 IS NULL OR s.class_id = ?1)
          AND (?2 IS NULL
               OR s.first_name LIKE ?2 ESCAPE '\'
               OR s.last_name LIKE ?2 ESCAPE '\'
               OR s.matricule LIKE ?2 ESCAPE '\')
        ORDER BY s.last_name ASC, s.first_name ASC, s.id ASC"#,
        STUDENT_SELECT
    ))
    .bind(filter.class_id)
    .bind(search)
    .fetch_all(db_pool)
    .await?;
    Ok(students)
}

pub async fn find_student<'e>(executor: impl SqliteExecutor<'e>, student_id: i64) -> AppResult<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(&format!("{} WHERE s.id = ?1", STUDENT_SELECT))
        .bind(student_id)
        .fetch_optional(executor)
        .await?;
    Ok(student)
}

pub async fn find_student_by_user<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
) -> AppResult<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(&format!("{} WHERE s.user_id = ?1", STUDENT_SELECT))
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(student)
}

pub async fn get_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<Student> {
    find_student(db_pool, student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Aluno não encontrado.".to_string()))
}

/// A conta tem de existir com papel student e a turma (se indicada) tem de existir.
async fn validate_refs(db_pool: &SqlitePool, input: &StudentInput) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    match user_service::find_user_by_id(db_pool, input.user_id).await? {
        None => errors.add("user_id", "O utilizador selecionado não existe."),
        Some(user) if user.role != Role::Student => {
            errors.add("user_id", "O utilizador tem de ter o papel student.")
        }
        Some(_) => {}
    }
    if let Some(class_id) = input.class_id {
        if !classe_service::classe_exists(db_pool, class_id).await? {
            errors.add("class_id", "A turma selecionada não existe.");
        }
    }
    errors.into_result()
}

/// Insere o aluno com a próxima matrícula. O contador é incrementado na mesma
/// transação que o INSERT, por isso dois pedidos simultâneos nunca recebem o
/// mesmo número.
async fn insert_student(db_pool: &SqlitePool, input: &StudentInput) -> AppResult<Student> {
    let mut tx = db_pool.begin().await?;

    let sequence: i64 = sqlx::query_scalar(
        "UPDATE counters SET value = value + 1 WHERE name = 'matricule' RETURNING value",
    )
    .fetch_one(&mut *tx)
    .await?;
    let matricule = match format_matricule(sequence) {
        Some(matricule) => matricule,
        None => {
            tracing::error!("Contador de matrículas esgotado ({}).", sequence);
            tx.rollback().await?;
            return Err(AppError::Conflict("Não há mais matrículas disponíveis.".to_string()));
        }
    };

    let insert = sqlx::query(
        r#"
        INSERT INTO students (user_id, class_id, first_name, last_name, matricule)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(input.user_id)
    .bind(input.class_id)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(&matricule)
    .execute(&mut *tx)
    .await;

    let id = match insert {
        Ok(result) => result.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("User {} já tem um registo de aluno.", input.user_id);
            tx.rollback().await?;
            return Err(AppError::Conflict(ALREADY_ENROLLED.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let student = find_student(&mut *tx, id)
        .await?
        .ok_or(AppError::InternalServerError)?;
    tx.commit().await?;

    tracing::info!("✅ Aluno {} criado com a matrícula {}.", student.full_name(), matricule);
    Ok(student)
}

/// Criação pelo admin.
pub async fn create_student(db_pool: &SqlitePool, input: &StudentInput) -> AppResult<Student> {
    tracing::info!("Criando aluno para o user {}", input.user_id);
    validate_refs(db_pool, input).await?;
    if find_student_by_user(db_pool, input.user_id).await?.is_some() {
        return Err(AppError::Conflict(ALREADY_ENROLLED.to_string()));
    }
    insert_student(db_pool, input).await
}

pub async fn update_student(db_pool: &SqlitePool, student_id: i64, input: &StudentInput) -> AppResult<Student> {
    get_student(db_pool, student_id).await?;
    validate_refs(db_pool, input).await?;
    if let Some(other) = find_student_by_user(db_pool, input.user_id).await? {
        if other.id != student_id {
            return Err(AppError::Conflict(
                "Este utilizador já está ligado a outro aluno.".to_string(),
            ));
        }
    }

    sqlx::query(
        r#"
        UPDATE students
        SET user_id = ?1, class_id = ?2, first_name = ?3, last_name = ?4
        WHERE id = ?5
        "#,
    )
    .bind(input.user_id)
    .bind(input.class_id)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(student_id)
    .execute(db_pool)
    .await?;

    tracing::info!("✅ Aluno {} atualizado.", student_id);
    get_student(db_pool, student_id).await
}

/// Muda o aluno de turma (`None` = deixa de ter turma).
pub async fn assign_class(db_pool: &SqlitePool, student_id: i64, class_id: Option<i64>) -> AppResult<Student> {
    get_student(db_pool, student_id).await?;
    if let Some(class_id) = class_id {
        if !classe_service::classe_exists(db_pool, class_id).await? {
            return Err(AppError::Validation(FieldErrors::single(
                "class_id",
                "A turma selecionada não existe.",
            )));
        }
    }
    sqlx::query("UPDATE students SET class_id = ?1 WHERE id = ?2")
        .bind(class_id)
        .bind(student_id)
        .execute(db_pool)
        .await?;
    tracing::info!("Aluno {} movido para a turma {:?}.", student_id, class_id);
    get_student(db_pool, student_id).await
}

/// Apaga o aluno; as suas presenças desaparecem com ele (ON DELETE CASCADE).
pub async fn delete_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM students WHERE id = ?1")
        .bind(student_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::NotFound("Aluno não encontrado.".to_string()));
    }
    tracing::info!("Aluno {} apagado.", student_id);
    Ok(())
}

/// Auto-inscrição do aluno autenticado.
pub async fn enroll(db_pool: &SqlitePool, caller: &Caller, payload: &EnrollPayload) -> AppResult<Student> {
    if caller.role != Role::Student {
        return Err(AppError::Forbidden("Reservado a alunos.".to_string()));
    }
    if find_student_by_user(db_pool, caller.id).await?.is_some() {
        tracing::warn!("User {} tentou inscrever-se de novo.", caller.id);
        return Err(AppError::Conflict("Já está inscrito.".to_string()));
    }

    let input = payload.validate(caller.id)?;
    validate_refs(db_pool, &input).await?;
    tracing::info!("Auto-inscrição do user {}", caller.id);
    insert_student(db_pool, &input).await
}

/// Registo de aluno do próprio autor.
pub async fn my_profile(db_pool: &SqlitePool, caller: &Caller) -> AppResult<Student> {
    find_student_by_user(db_pool, caller.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Nenhum perfil de aluno associado.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::create_test_pool, models::classe::ClasseInput};

    async fn student_caller(pool: &SqlitePool, email: &str) -> Caller {
        let user = user_service::create_user(pool, "Aluno", email, "pass", Role::Student)
            .await
            .unwrap();
        Caller {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }

    fn enroll_payload(class_id: Option<i64>) -> EnrollPayload {
        EnrollPayload {
            class_id,
            first_name: Some("Léa".into()),
            last_name: Some("Martin".into()),
        }
    }

    fn is_matricule(value: &str) -> bool {
        value.len() == 10
            && value.starts_with("IUT-")
            && value[4..].chars().all(|c| c.is_ascii_digit())
    }

    #[tokio::test]
    async fn enroll_twice_is_a_conflict() {
        let pool = create_test_pool().await;
        let caller = student_caller(&pool, "lea@iut.fr").await;

        let student = enroll(&pool, &caller, &enroll_payload(None)).await.unwrap();
        assert!(is_matricule(&student.matricule), "{}", student.matricule);
        assert_eq!(student.class_id, None);

        assert!(matches!(
            enroll(&pool, &caller, &enroll_payload(None)).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn matricules_are_sequential_and_never_reused() {
        let pool = create_test_pool().await;
        let a = student_caller(&pool, "a@iut.fr").await;
        let b = student_caller(&pool, "b@iut.fr").await;
        let c = student_caller(&pool, "c@iut.fr").await;

        let first = enroll(&pool, &a, &enroll_payload(None)).await.unwrap();
        let second = enroll(&pool, &b, &enroll_payload(None)).await.unwrap();
        assert_eq!(first.matricule, "IUT-000001");
        assert_eq!(second.matricule, "IUT-000002");

        // Apagar o último não faz o número voltar atrás
        delete_student(&pool, second.id).await.unwrap();
        let third = enroll(&pool, &c, &enroll_payload(None)).await.unwrap();
        assert_eq!(third.matricule, "IUT-000003");
    }

    #[tokio::test]
    async fn enroll_with_unknown_class_is_a_field_error() {
        let pool = create_test_pool().await;
        let caller = student_caller(&pool, "x@iut.fr").await;
        match enroll(&pool, &caller, &enroll_payload(Some(77))).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("class_id")),
            other => panic!("esperava validação, obtive {:?}", other),
        }
    }

    #[tokio::test]
    async fn admin_create_rejects_non_student_accounts() {
        let pool = create_test_pool().await;
        let teacher = user_service::create_user(&pool, "Prof", "p@iut.fr", "pass", Role::Teacher)
            .await
            .unwrap();
        let input = StudentInput {
            user_id: teacher.id,
            class_id: None,
            first_name: "A".into(),
            last_name: "B".into(),
        };
        match create_student(&pool, &input).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("user_id")),
            other => panic!("esperava validação, obtive {:?}", other),
        }
    }

    #[tokio::test]
    async fn search_and_class_filter() {
        let pool = create_test_pool().await;
        let classe = classe_service::create_classe(
            &pool,
            &ClasseInput { name: "GEA-1".into(), description: None },
        )
        .await
        .unwrap();
        let a = student_caller(&pool, "a@iut.fr").await;
        let b = student_caller(&pool, "b@iut.fr").await;
        enroll(&pool, &a, &enroll_payload(Some(classe.id))).await.unwrap();
        enroll(
            &pool,
            &b,
            &EnrollPayload {
                class_id: None,
                first_name: Some("Hugo".into()),
                last_name: Some("Bernard".into()),
            },
        )
        .await
        .unwrap();

        let in_class = list_students(&pool, &StudentFilter { class_id: Some(classe.id), search: None })
            .await
            .unwrap();
        assert_eq!(in_class.len(), 1);
        assert_eq!(in_class[0].class_name.as_deref(), Some("GEA-1"));

        let found = list_students(&pool, &StudentFilter { class_id: None, search: Some("bern".into()) })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Hugo");
    }

    #[tokio::test]
    async fn deleting_class_unassigns_students() {
        let pool = create_test_pool().await;
        let classe = classe_service::create_classe(
            &pool,
            &ClasseInput { name: "TC-1".into(), description: None },
        )
        .await
        .unwrap();
        let caller = student_caller(&pool, "t@iut.fr").await;
        let student = enroll(&pool, &caller, &enroll_payload(Some(classe.id))).await.unwrap();

        classe_service::delete_classe(&pool, classe.id).await.unwrap();
        let reloaded = get_student(&pool, student.id).await.unwrap();
        assert_eq!(reloaded.class_id, None);
        assert_eq!(reloaded.class_name, None);
    }
    #[tokio::test]
    async fn search_wildcards_are_literal() {
        let pool = create_test_pool().await;
        let a = student_caller(&pool, "a@iut.fr").await;
        let b = student_caller(&pool, "b@iut.fr").await;
        enroll(&pool, &a, &enroll_payload(None)).await.unwrap();
        enroll(
            &pool,
            &b,
            &EnrollPayload {
                class_id: None,
                first_name: Some("Ana_B".into()),
                last_name: Some("Dupont".into()),
            },
        )
        .await
        .unwrap();

        let search = |term: &str| StudentFilter { class_id: None, search: Some(term.into()) };
        assert!(list_students(&pool, &search("%")).await.unwrap().is_empty());
        assert!(list_students(&pool, &search("_ea")).await.unwrap().is_empty());

        let found = list_students(&pool, &search("a_b")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Ana_B");
    }

    #[tokio::test]
    async fn exhausted_matricule_counter_is_a_conflict() {
        let pool = create_test_pool().await;
        sqlx::query("UPDATE counters SET value = ?1 WHERE name = 'matricule'")
            .bind(crate::models::student::MAX_MATRICULE_SEQUENCE)
            .execute(&pool)
            .await
            .unwrap();
        let caller = student_caller(&pool, "z@iut.fr").await;

        assert!(matches!(
            enroll(&pool, &caller, &enroll_payload(None)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(find_student_by_user(&pool, caller.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn assign_class_moves_and_unassigns() {
        let pool = create_test_pool().await;
        let classe = classe_service::create_classe(
            &pool,
            &ClasseInput { name: "MMI-1".into(), description: None },
        )
        .await
        .unwrap();
        let caller = student_caller(&pool, "m@iut.fr").await;
        let student = enroll(&pool, &caller, &enroll_payload(None)).await.unwrap();

        let moved = assign_class(&pool, student.id, Some(classe.id)).await.unwrap();
        assert_eq!(moved.class_id, Some(classe.id));
        assert_eq!(moved.class_name.as_deref(), Some("MMI-1"));

        match assign_class(&pool, student.id, Some(999)).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("class_id")),
            other => panic!("esperava validação, obtive {:?}", other),
        }
        assert_eq!(get_student(&pool, student.id).await.unwrap().class_id, Some(classe.id));

        let unassigned = assign_class(&pool, student.id, None).await.unwrap();
        assert_eq!(unassigned.class_id, None);
        assert_eq!(unassigned.class_name, None);

        assert!(matches!(
            assign_class(&pool, 4242, None).await,
            Err(AppError::NotFound(_))
        ));
    }
}
