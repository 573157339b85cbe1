// src/models/student.rs
use crate::{
    error::{AppResult, FieldErrors},
    validation::{required_id, required_text, MAX_TEXT_LEN},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MATRICULE_PREFIX: &str = "IUT-";

/// Último número que ainda cabe nos 6 dígitos.
pub const MAX_MATRICULE_SEQUENCE: i64 = 999_999;

/// Matrícula legível: `IUT-` seguido de 6 dígitos.
/// `None` quando o contador já não cabe no formato.
pub fn format_matricule(sequence: i64) -> Option<String> {
    if !(1..=MAX_MATRICULE_SEQUENCE).contains(&sequence) {
        return None;
    }
    Some(format!("{}{:06}", MATRICULE_PREFIX, sequence))
}

/// Aluno com a turma e a conta associadas.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub user_id: i64,
    pub class_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub matricule: String,
    pub class_name: Option<String>,
    pub user_name: String,
    pub email: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Payload do admin (criação e edição).
#[derive(Debug, Default, Deserialize)]
pub struct StudentPayload {
    pub user_id: Option<i64>,
    pub class_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Payload da auto-inscrição do próprio aluno.
#[derive(Debug, Default, Deserialize)]
pub struct EnrollPayload {
    pub class_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssignClassPayload {
    pub class_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StudentFilter {
    pub class_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StudentInput {
    pub user_id: i64,
    pub class_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
}

fn names(errors: &mut FieldErrors, first: Option<&str>, last: Option<&str>) -> (String, String) {
    let first_name = required_text(errors, "first_name", first, MAX_TEXT_LEN);
    let last_name = required_text(errors, "last_name", last, MAX_TEXT_LEN);
    (first_name.unwrap_or_default(), last_name.unwrap_or_default())
}

impl StudentPayload {
    pub fn validate(&self) -> AppResult<StudentInput> {
        let mut errors = FieldErrors::new();
        let user_id = required_id(&mut errors, "user_id", self.user_id);
        let (first_name, last_name) =
            names(&mut errors, self.first_name.as_deref(), self.last_name.as_deref());
        errors.into_result()?;
        Ok(StudentInput {
            user_id: user_id.unwrap_or_default(),
            class_id: self.class_id,
            first_name,
            last_name,
        })
    }
}

impl EnrollPayload {
    /// O `user_id` é sempre o do próprio autor do pedido.
    pub fn validate(&self, user_id: i64) -> AppResult<StudentInput> {
        let mut errors = FieldErrors::new();
        let (first_name, last_name) =
            names(&mut errors, self.first_name.as_deref(), self.last_name.as_deref());
        errors.into_result()?;
        Ok(StudentInput {
            user_id,
            class_id: self.class_id,
            first_name,
            last_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matricule_is_zero_padded() {
        assert_eq!(format_matricule(1).as_deref(), Some("IUT-000001"));
        assert_eq!(format_matricule(123456).as_deref(), Some("IUT-123456"));
        assert_eq!(format_matricule(MAX_MATRICULE_SEQUENCE).as_deref(), Some("IUT-999999"));
    }

    #[test]
    fn matricule_never_grows_past_six_digits() {
        assert_eq!(format_matricule(MAX_MATRICULE_SEQUENCE + 1), None);
        assert_eq!(format_matricule(0), None);
    }

    #[test]
    fn enroll_requires_names() {
        let payload = EnrollPayload {
            class_id: None,
            first_name: Some("Léa".into()),
            last_name: None,
        };
        match payload.validate(7) {
            Err(crate::error::AppError::Validation(errors)) => {
                assert!(errors.contains("last_name"));
                assert!(!errors.contains("first_name"));
            }
            other => panic!("esperava erro de validação, obtive {:?}", other),
        }
    }
}
