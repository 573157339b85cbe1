// src/models/class_teacher.rs
use crate::{
    error::{AppResult, FieldErrors},
    validation::required_id,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Associação turma ↔ professor, com os nomes já resolvidos.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ClassTeacher {
    pub id: i64,
    pub class_id: i64,
    pub class_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub teacher_email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassTeacherPayload {
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassTeacherInput {
    pub class_id: i64,
    pub teacher_id: i64,
}

impl ClassTeacherPayload {
    pub fn validate(&self) -> AppResult<ClassTeacherInput> {
        let mut errors = FieldErrors::new();
        let class_id = required_id(&mut errors, "class_id", self.class_id);
        let teacher_id = required_id(&mut errors, "teacher_id", self.teacher_id);
        match (class_id, teacher_id) {
            (Some(class_id), Some(teacher_id)) => Ok(ClassTeacherInput { class_id, teacher_id }),
            _ => Err(crate::error::AppError::Validation(errors)),
        }
    }
}
