// src/models/presence.rs
use crate::{
    error::{AppResult, FieldErrors},
    validation::{required_date, required_id},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PresenceStatus {
    Present,
    Absent,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Present => "present",
            PresenceStatus::Absent => "absent",
        }
    }

    pub fn parse(value: &str) -> Option<PresenceStatus> {
        match value.trim() {
            "present" => Some(PresenceStatus::Present),
            "absent" => Some(PresenceStatus::Absent),
            _ => None,
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registo de presença com os dados do aluno e da turma.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Presence {
    pub id: i64,
    pub student_id: i64,
    pub date: NaiveDate,
    pub status: PresenceStatus,
    pub first_name: String,
    pub last_name: String,
    pub matricule: String,
    pub email: Option<String>,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PresencePayload {
    pub student_id: Option<i64>,
    pub date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct PresenceInput {
    pub student_id: i64,
    pub date: NaiveDate,
    pub status: PresenceStatus,
}

impl PresencePayload {
    pub fn validate(&self) -> AppResult<PresenceInput> {
        let mut errors = FieldErrors::new();
        let student_id = required_id(&mut errors, "student_id", self.student_id);
        let date = required_date(&mut errors, "date", self.date.as_deref());
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("status", "O campo status é obrigatório.");
                None
            }
            Some(value) => {
                let parsed = PresenceStatus::parse(value);
                if parsed.is_none() {
                    errors.add("status", "O status deve ser 'present' ou 'absent'.");
                }
                parsed
            }
        };
        match (student_id, date, status) {
            (Some(student_id), Some(date), Some(status)) => Ok(PresenceInput {
                student_id,
                date,
                status,
            }),
            _ => Err(crate::error::AppError::Validation(errors)),
        }
    }
}

/// Filtros de listagem (`?class_id=&date=&student_id=`).
#[derive(Debug, Default, Deserialize)]
pub struct PresenceFilter {
    pub class_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub student_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateFilter {
    pub date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_collects_every_invalid_field() {
        let payload = PresencePayload {
            student_id: None,
            date: Some("ontem".into()),
            status: Some("late".into()),
        };
        match payload.validate() {
            Err(crate::error::AppError::Validation(errors)) => {
                assert!(errors.contains("student_id"));
                assert!(errors.contains("date"));
                assert!(errors.contains("status"));
            }
            other => panic!("esperava erro de validação, obtive {:?}", other),
        }
    }

    #[test]
    fn valid_payload() {
        let payload = PresencePayload {
            student_id: Some(4),
            date: Some("2025-02-03".into()),
            status: Some("absent".into()),
        };
        let input = payload.validate().unwrap();
        assert_eq!(input.student_id, 4);
        assert_eq!(input.status, PresenceStatus::Absent);
        assert_eq!(input.date, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
    }
}
