// src/validation.rs
// Pequenas regras de validação partilhadas pelos payloads JSON e formulários.
use crate::error::FieldErrors;
use chrono::NaiveDate;

pub const MAX_TEXT_LEN: usize = 255;

/// Texto obrigatório, aparado, com tamanho máximo.
pub fn required_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Option<String> {
    match value.map(str::trim) {
        None | Some("") => {
            errors.add(field, format!("O campo {} é obrigatório.", field));
            None
        }
        Some(v) if v.chars().count() > max_len => {
            errors.add(
                field,
                format!("O campo {} não pode exceder {} caracteres.", field, max_len),
            );
            None
        }
        Some(v) => Some(v.to_string()),
    }
}

/// Texto opcional: vazio passa a `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn required_id(errors: &mut FieldErrors, field: &str, value: Option<i64>) -> Option<i64> {
    match value {
        Some(id) if id > 0 => Some(id),
        Some(_) => {
            errors.add(field, format!("O campo {} é inválido.", field));
            None
        }
        None => {
            errors.add(field, format!("O campo {} é obrigatório.", field));
            None
        }
    }
}

/// Data no formato `AAAA-MM-DD`.
pub fn required_date(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<NaiveDate> {
    match value.map(str::trim) {
        None | Some("") => {
            errors.add(field, format!("O campo {} é obrigatório.", field));
            None
        }
        Some(v) => match NaiveDate::parse_from_str(v, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add(field, format!("O campo {} não é uma data válida.", field));
                None
            }
        },
    }
}

/// Verificação simples de email: `local@dominio.tld`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
