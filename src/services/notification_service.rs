// src/services/notification_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{notification::Notification, user::Caller},
    services::user_service,
};
use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};

/// Mensagem enviada aos admins quando um professor marca uma presença.
pub fn presence_message(student_name: &str, class_name: &str, date: NaiveDate) -> String {
    format!(
        "Nova presença registada para {} ({}, {}).",
        student_name,
        class_name,
        date.format("%Y-%m-%d")
    )
}

/// Cria uma notificação não lida para cada administrador. Corre na conexão
/// (ou transação) recebida, para ficar atómica com a escrita que a originou.
pub async fn notify_admins(conn: &mut SqliteConnection, message: &str) -> AppResult<usize> {
    let admin_ids = user_service::find_admin_ids(&mut *conn).await?;
    // Um INSERT por admin; chega enquanto houver poucos administradores
    for admin_id in &admin_ids {
        sqlx::query("INSERT INTO notifications (user_id, message, read) VALUES (?1, ?2, 0)")
            .bind(admin_id)
            .bind(message)
            .execute(&mut *conn)
            .await?;
    }
    tracing::debug!("🔔 {} notificação(ões) criada(s): {}", admin_ids.len(), message);
    Ok(admin_ids.len())
}

/// Notificações do autor do pedido, mais recentes primeiro.
pub async fn list_for(db_pool: &SqlitePool, caller: &Caller) -> AppResult<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, message, read, created_at
        FROM notifications
        WHERE user_id = ?1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(caller.id)
    .fetch_all(db_pool)
    .await?;
    Ok(notifications)
}

pub async fn unread_count(db_pool: &SqlitePool, caller: &Caller) -> AppResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
    )
    .bind(caller.id)
    .fetch_one(db_pool)
    .await?;
    Ok(count)
}

/// Marca uma notificação como lida. Só o destinatário o pode fazer; para os
/// outros a notificação "não existe".
pub async fn mark_as_read(db_pool: &SqlitePool, caller: &Caller, notification_id: i64) -> AppResult<()> {
    let rows_affected = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?1 AND user_id = ?2")
        .bind(notification_id)
        .bind(caller.id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::NotFound("Notificação não encontrada.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::create_test_pool, models::user::Role};

    async fn caller(pool: &SqlitePool, email: &str, role: Role) -> Caller {
        let user = user_service::create_user(pool, "X", email, "pass", role).await.unwrap();
        Caller { id: user.id, name: user.name, email: user.email, role }
    }

    #[tokio::test]
    async fn fan_out_and_mark_read() {
        let pool = create_test_pool().await;
        let admin1 = caller(&pool, "a1@iut.fr", Role::Admin).await;
        let admin2 = caller(&pool, "a2@iut.fr", Role::Admin).await;
        let teacher = caller(&pool, "t@iut.fr", Role::Teacher).await;

        let mut conn = pool.acquire().await.unwrap();
        let sent = notify_admins(&mut conn, "primeira").await.unwrap();
        notify_admins(&mut conn, "segunda").await.unwrap();
        drop(conn);
        assert_eq!(sent, 2);

        let list = list_for(&pool, &admin1).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].message, "segunda");
        assert!(list.iter().all(|n| !n.read));
        assert!(list_for(&pool, &teacher).await.unwrap().is_empty());

        // admin2 não pode marcar a notificação do admin1
        assert!(matches!(
            mark_as_read(&pool, &admin2, list[0].id).await,
            Err(AppError::NotFound(_))
        ));
        mark_as_read(&pool, &admin1, list[0].id).await.unwrap();
        assert_eq!(unread_count(&pool, &admin1).await.unwrap(), 1);
        assert_eq!(unread_count(&pool, &admin2).await.unwrap(), 2);
    }

    #[test]
    fn message_names_student_class_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let msg = presence_message("Léa Martin", "GEII-1", date);
        assert!(msg.contains("Léa Martin"));
        assert!(msg.contains("GEII-1"));
        assert!(msg.contains("2025-03-14"));
    }
}
