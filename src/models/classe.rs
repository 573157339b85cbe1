// src/models/classe.rs
use crate::{
    error::{AppResult, FieldErrors},
    validation::{optional_text, required_text, MAX_TEXT_LEN},
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Uma turma/sala, com o número de alunos inscritos.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Classe {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub students_count: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClassePayload {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Payload já validado.
#[derive(Debug, Clone)]
pub struct ClasseInput {
    pub name: String,
    pub description: Option<String>,
}

impl ClassePayload {
    pub fn validate(&self) -> AppResult<ClasseInput> {
        let mut errors = FieldErrors::new();
        let name = required_text(&mut errors, "name", self.name.as_deref(), MAX_TEXT_LEN);
        errors.into_result()?;
        Ok(ClasseInput {
            name: name.unwrap_or_default(),
            description: optional_text(self.description.as_deref()),
        })
    }
}

/// Um aluno na lista (roster) de uma turma.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RosterEntry {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub matricule: String,
    pub email: Option<String>,
}
