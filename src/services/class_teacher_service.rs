// src/services/class_teacher_service.rs
use crate::{
    error::{is_unique_violation, AppError, AppResult, FieldErrors},
    models::{
        class_teacher::{ClassTeacher, ClassTeacherInput},
        classe::Classe,
        user::Role,
    },
    services::{classe_service, user_service},
};
use sqlx::{SqliteExecutor, SqlitePool};

const DUPLICATE_LINK: &str = "Este professor já está associado a esta turma.";

const LINK_SELECT: &str = r#"
    SELECT ct.id, ct.class_id, c.name AS class_name,
           ct.teacher_id, u.name AS teacher_name, u.email AS teacher_email
    FROM class_teacher ct
    JOIN classes c ON c.id = ct.class_id
    JOIN users u ON u.id = ct.teacher_id
"#;

pub async fn list_links(db_pool: &SqlitePool) -> AppResult<Vec<ClassTeacher>> {
    tracing::debug!("Buscando associações turma-professor...");
    let links = sqlx::query_as::<_, ClassTeacher>(&format!("{} ORDER BY c.name ASC, u.name ASC", LINK_SELECT))
        .fetch_all(db_pool)
        .await?;
    Ok(links)
}

pub async fn get_link(db_pool: &SqlitePool, link_id: i64) -> AppResult<ClassTeacher> {
    sqlx::query_as::<_, ClassTeacher>(&format!("{} WHERE ct.id = ?1", LINK_SELECT))
        .bind(link_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Associação não encontrada.".to_string()))
}

/// A turma tem de existir e o utilizador tem de ser professor.
async fn validate_refs(db_pool: &SqlitePool, input: &ClassTeacherInput) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if !classe_service::classe_exists(db_pool, input.class_id).await? {
        errors.add("class_id", "A turma selecionada não existe.");
    }
    match user_service::find_user_by_id(db_pool, input.teacher_id).await? {
        None => errors.add("teacher_id", "O utilizador selecionado não existe."),
        Some(user) if user.role != Role::Teacher => {
            errors.add("teacher_id", "O utilizador tem de ter o papel teacher.")
        }
        Some(_) => {}
    }
    errors.into_result()
}

pub async fn create_link(db_pool: &SqlitePool, input: &ClassTeacherInput) -> AppResult<ClassTeacher> {
    tracing::info!("Associando professor {} à turma {}", input.teacher_id, input.class_id);
    validate_refs(db_pool, input).await?;

    // A constraint UNIQUE(class_id, teacher_id) decide os duplicados
    let insert = sqlx::query("INSERT INTO class_teacher (class_id, teacher_id) VALUES (?1, ?2)")
        .bind(input.class_id)
        .bind(input.teacher_id)
        .execute(db_pool)
        .await;

    let id = match insert {
        Ok(result) => result.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!(
                "Associação duplicada: professor {} / turma {}",
                input.teacher_id,
                input.class_id
            );
            return Err(AppError::Conflict(DUPLICATE_LINK.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    get_link(db_pool, id).await
}

pub async fn update_link(db_pool: &SqlitePool, link_id: i64, input: &ClassTeacherInput) -> AppResult<ClassTeacher> {
    get_link(db_pool, link_id).await?;
    validate_refs(db_pool, input).await?;

    let update = sqlx::query("UPDATE class_teacher SET class_id = ?1, teacher_id = ?2 WHERE id = ?3")
        .bind(input.class_id)
        .bind(input.teacher_id)
        .bind(link_id)
        .execute(db_pool)
        .await;
    match update {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Err(AppError::Conflict(DUPLICATE_LINK.to_string())),
        Err(e) => return Err(e.into()),
    }
    tracing::info!("✅ Associação {} atualizada.", link_id);
    get_link(db_pool, link_id).await
}

pub async fn delete_link(db_pool: &SqlitePool, link_id: i64) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM class_teacher WHERE id = ?1")
        .bind(link_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::NotFound("Associação não encontrada.".to_string()));
    }
    tracing::info!("Associação {} apagada.", link_id);
    Ok(())
}

pub async fn is_teacher_of<'e>(
    executor: impl SqliteExecutor<'e>,
    teacher_id: i64,
    class_id: i64,
) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM class_teacher WHERE teacher_id = ?1 AND class_id = ?2",
    )
    .bind(teacher_id)
    .bind(class_id)
    .fetch_optional(executor)
    .await?;
    Ok(found.is_some())
}

/// Turmas atribuídas a um professor, com o número de alunos.
pub async fn classes_of_teacher(db_pool: &SqlitePool, teacher_id: i64) -> AppResult<Vec<Classe>> {
    let classes = sqlx::query_as::<_, Classe>(
        r#"
        SELECT c.id, c.name, c.description,
               (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS students_count
        FROM classes c
        JOIN class_teacher ct ON ct.class_id = c.id
        WHERE ct.teacher_id = ?1
        ORDER BY c.name ASC, c.id ASC
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Professor {} tem {} turma(s).", teacher_id, classes.len());
    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::create_test_pool, models::classe::ClasseInput};

    async fn setup(pool: &SqlitePool) -> (i64, i64, i64) {
        let classe = classe_service::create_classe(
            pool,
            &ClasseInput { name: "INFO-1".into(), description: None },
        )
        .await
        .unwrap();
        let teacher = user_service::create_user(pool, "Prof", "prof@iut.fr", "pass", Role::Teacher)
            .await
            .unwrap();
        let student = user_service::create_user(pool, "Aluno", "aluno@iut.fr", "pass", Role::Student)
            .await
            .unwrap();
        (classe.id, teacher.id, student.id)
    }

    #[tokio::test]
    async fn duplicate_pair_is_a_conflict() {
        let pool = create_test_pool().await;
        let (class_id, teacher_id, _) = setup(&pool).await;
        let input = ClassTeacherInput { class_id, teacher_id };

        let link = create_link(&pool, &input).await.unwrap();
        assert_eq!(link.teacher_name, "Prof");
        assert!(is_teacher_of(&pool, teacher_id, class_id).await.unwrap());

        assert!(matches!(create_link(&pool, &input).await, Err(AppError::Conflict(_))));
        assert_eq!(list_links(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_teachers_can_be_linked() {
        let pool = create_test_pool().await;
        let (class_id, _, student_id) = setup(&pool).await;
        match create_link(&pool, &ClassTeacherInput { class_id, teacher_id: student_id }).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("teacher_id")),
            other => panic!("esperava validação, obtive {:?}", other),
        }
        match create_link(&pool, &ClassTeacherInput { class_id: 999, teacher_id: student_id }).await {
            Err(AppError::Validation(errors)) => assert!(errors.contains("class_id")),
            other => panic!("esperava validação, obtive {:?}", other),
        }
    }

    #[tokio::test]
    async fn teacher_classes_listing() {
        let pool = create_test_pool().await;
        let (class_id, teacher_id, _) = setup(&pool).await;
        assert!(classes_of_teacher(&pool, teacher_id).await.unwrap().is_empty());

        let link = create_link(&pool, &ClassTeacherInput { class_id, teacher_id }).await.unwrap();
        let classes = classes_of_teacher(&pool, teacher_id).await.unwrap();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].id, class_id);

        delete_link(&pool, link.id).await.unwrap();
        assert!(classes_of_teacher(&pool, teacher_id).await.unwrap().is_empty());
    }
    #[tokio::test]
    async fn update_onto_existing_pair_is_a_conflict() {
        let pool = create_test_pool().await;
        let (class_id, teacher_id, _) = setup(&pool).await;
        let other_class = classe_service::create_classe(
            &pool,
            &ClasseInput { name: "INFO-2".into(), description: None },
        )
        .await
        .unwrap();

        create_link(&pool, &ClassTeacherInput { class_id, teacher_id }).await.unwrap();
        let second = create_link(&pool, &ClassTeacherInput { class_id: other_class.id, teacher_id })
            .await
            .unwrap();

        assert!(matches!(
            update_link(&pool, second.id, &ClassTeacherInput { class_id, teacher_id }).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(get_link(&pool, second.id).await.unwrap().class_id, other_class.id);

        let second_teacher = user_service::create_user(&pool, "Prof 2", "prof2@iut.fr", "pass", Role::Teacher)
            .await
            .unwrap();
        let moved = update_link(
            &pool,
            second.id,
            &ClassTeacherInput { class_id: other_class.id, teacher_id: second_teacher.id },
        )
        .await
        .unwrap();
        assert_eq!(moved.teacher_name, "Prof 2");
        assert!(!is_teacher_of(&pool, teacher_id, other_class.id).await.unwrap());

        assert!(matches!(
            update_link(&pool, 999, &ClassTeacherInput { class_id, teacher_id }).await,
            Err(AppError::NotFound(_))
        ));
    }
}
