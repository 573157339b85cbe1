// src/services/classe_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        classe::{Classe, ClasseInput, RosterEntry},
        user::{Caller, Role},
    },
    services::class_teacher_service,
};
use sqlx::{SqliteExecutor, SqlitePool};

const CLASSE_SELECT: &str = r#"
    SELECT c.id, c.name, c.description,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS students_count
    FROM classes c
"#;

pub async fn list_classes(db_pool: &SqlitePool) -> AppResult<Vec<Classe>> {
    tracing::debug!("Buscando todas as turmas...");
    let classes = sqlx::query_as::<_, Classe>(&format!("{} ORDER BY c.name ASC, c.id ASC", CLASSE_SELECT))
        .fetch_all(db_pool)
        .await?;
    Ok(classes)
}

pub async fn find_classe<'e>(executor: impl SqliteExecutor<'e>, class_id: i64) -> AppResult<Option<Classe>> {
    let classe = sqlx::query_as::<_, Classe>(&format!("{} WHERE c.id = ?1", CLASSE_SELECT))
        .bind(class_id)
        .fetch_optional(executor)
        .await?;
    Ok(classe)
}

pub async fn classe_exists<'e>(executor: impl SqliteExecutor<'e>, class_id: i64) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM classes WHERE id = ?1")
        .bind(class_id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

/// Como `find_classe`, mas uma turma inexistente é um 404.
pub async fn get_classe(db_pool: &SqlitePool, class_id: i64) -> AppResult<Classe> {
    find_classe(db_pool, class_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Turma não encontrada.".to_string()))
}

pub async fn create_classe(db_pool: &SqlitePool, input: &ClasseInput) -> AppResult<Classe> {
    tracing::info!("Criando turma '{}'", input.name);
    let id = sqlx::query("INSERT INTO classes (name, description) VALUES (?1, ?2)")
        .bind(&input.name)
        .bind(&input.description)
        .execute(db_pool)
        .await?
        .last_insert_rowid();
    get_classe(db_pool, id).await
}

pub async fn update_classe(db_pool: &SqlitePool, class_id: i64, input: &ClasseInput) -> AppResult<Classe> {
    tracing::info!("Atualizando turma {}", class_id);
    let rows_affected = sqlx::query("UPDATE classes SET name = ?1, description = ?2 WHERE id = ?3")
        .bind(&input.name)
        .bind(&input.description)
        .bind(class_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao atualizar: turma {} não encontrada.", class_id);
        return Err(AppError::NotFound("Turma não encontrada.".to_string()));
    }
    get_classe(db_pool, class_id).await
}

/// Apaga a turma. Os alunos ficam sem turma (ON DELETE SET NULL) e as
/// associações com professores desaparecem (ON DELETE CASCADE).
pub async fn delete_classe(db_pool: &SqlitePool, class_id: i64) -> AppResult<()> {
    tracing::info!("Apagando turma {}", class_id);
    let rows_affected = sqlx::query("DELETE FROM classes WHERE id = ?1")
        .bind(class_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::NotFound("Turma não encontrada.".to_string()));
    }
    Ok(())
}

/// Garante que o autor pode ver os dados de uma turma:
/// admin sempre, professor apenas se estiver associado a ela.
pub async fn ensure_class_scope(db_pool: &SqlitePool, caller: &Caller, class_id: i64) -> AppResult<()> {
    let allowed = match caller.role {
        Role::Admin => true,
        Role::Teacher => class_teacher_service::is_teacher_of(db_pool, caller.id, class_id).await?,
        Role::Student => false,
    };
    if allowed {
        Ok(())
    } else {
        tracing::warn!("Acesso à turma {} negado para user {}", class_id, caller.id);
        Err(AppError::Forbidden("Turma não atribuída.".to_string()))
    }
}

/// Lista de alunos (roster) de uma turma, sem verificação de acesso.
pub async fn roster_of(db_pool: &SqlitePool, class_id: i64) -> AppResult<Vec<RosterEntry>> {
    let roster = sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT s.id, s.first_name, s.last_name, s.matricule, u.email
        FROM students s
        LEFT JOIN users u ON u.id = s.user_id
        WHERE s.class_id = ?1
        ORDER BY s.last_name ASC, s.first_name ASC
        "#,
    )
    .bind(class_id)
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Turma {}: {} alunos.", class_id, roster.len());
    Ok(roster)
}

/// Roster visto pelo autor: admin ou professor da turma.
pub async fn class_roster(db_pool: &SqlitePool, caller: &Caller, class_id: i64) -> AppResult<Vec<RosterEntry>> {
    if !classe_exists(db_pool, class_id).await? {
        return Err(AppError::NotFound("Turma não encontrada.".to_string()));
    }
    ensure_class_scope(db_pool, caller, class_id).await?;
    roster_of(db_pool, class_id).await
}
