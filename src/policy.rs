// src/policy.rs
//! Tabela de permissões da API: (método, rota) -> quem pode chamar.
//!
//! É consultada uma vez por pedido pelo middleware `mw_policy::enforce`.
//! Rotas que não constam da tabela são recusadas. As verificações de
//! posse ("professor desta turma", "a minha notificação") ficam nos serviços.

use crate::models::user::Role;
use axum::http::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Qualquer utilizador autenticado.
    Authenticated,
    Admin,
    Teacher,
    Student,
    AdminOrTeacher,
}

impl Access {
    pub fn allows(self, role: Role) -> bool {
        match self {
            Access::Authenticated => true,
            Access::Admin => role == Role::Admin,
            Access::Teacher => role == Role::Teacher,
            Access::Student => role == Role::Student,
            Access::AdminOrTeacher => matches!(role, Role::Admin | Role::Teacher),
        }
    }
}

pub struct Rule {
    pub method: &'static str,
    pub path: &'static str,
    pub access: Access,
}

const fn rule(method: &'static str, path: &'static str, access: Access) -> Rule {
    Rule { method, path, access }
}

/// Os caminhos são os padrões registados no router (`MatchedPath`).
pub static POLICY: &[Rule] = &[
    rule("POST", "/logout", Access::Authenticated),
    rule("GET", "/actor", Access::Authenticated),
    // Utilizadores
    rule("GET", "/user", Access::Admin),
    rule("GET", "/teacher", Access::Admin),
    // Turmas
    rule("GET", "/classes", Access::Admin),
    rule("POST", "/classes", Access::Admin),
    rule("GET", "/classes/{id}", Access::Admin),
    rule("PUT", "/classes/{id}", Access::Admin),
    rule("DELETE", "/classes/{id}", Access::Admin),
    rule("GET", "/classes/{id}/students", Access::AdminOrTeacher),
    // Associações turma-professor
    rule("GET", "/class-teachers", Access::Admin),
    rule("POST", "/class-teachers", Access::Admin),
    rule("GET", "/class-teachers/{id}", Access::Admin),
    rule("PUT", "/class-teachers/{id}", Access::Admin),
    rule("DELETE", "/class-teachers/{id}", Access::Admin),
    // Alunos
    rule("GET", "/students", Access::Admin),
    rule("POST", "/students", Access::Admin),
    rule("GET", "/students/{id}", Access::Admin),
    rule("PUT", "/students/{id}", Access::Admin),
    rule("DELETE", "/students/{id}", Access::Admin),
    rule("PUT", "/students/{id}/class", Access::Admin),
    rule("POST", "/students/enroll", Access::Student),
    rule("GET", "/student/profile", Access::Student),
    // Presenças
    rule("GET", "/presences", Access::Admin),
    rule("POST", "/presences", Access::AdminOrTeacher),
    rule("GET", "/presences/{id}", Access::Admin),
    rule("PUT", "/presences/{id}", Access::Admin),
    rule("DELETE", "/presences/{id}", Access::Admin),
    rule("GET", "/presences/class/{id}", Access::AdminOrTeacher),
    rule("POST", "/store", Access::AdminOrTeacher),
    rule("GET", "/myPresences", Access::Student),
    // Professor
    rule("GET", "/teacher/classes", Access::Teacher),
    rule("GET", "/teacher/profile", Access::Teacher),
    rule("GET", "/teacher/stats", Access::Teacher),
    rule("GET", "/teacher/summary", Access::Teacher),
    // Estatísticas e notificações
    rule("GET", "/stats", Access::Admin),
    rule("GET", "/notifications", Access::Authenticated),
    rule("PUT", "/notifications/{id}/read", Access::Authenticated),
];

/// Procura a regra de um pedido. `None` = rota sem regra (recusar).
pub fn lookup(method: &Method, path: &str) -> Option<Access> {
    POLICY
        .iter()
        .find(|r| r.method == method.as_str() && r.path == path)
        .map(|r| r.access)
}
