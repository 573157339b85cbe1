// src/templates.rs
use askama::Template; // Trait necessário para Askama
use crate::models::{
    classe::{Classe, RosterEntry},
    presence::Presence,
    stats::{GlobalStats, TeacherStats, TeacherSummary},
    student::Student,
    user::PublicUser,
};
use chrono::NaiveDate;
use std::borrow::Borrow;

/// Rácio 0..1 em percentagem com uma casa decimal.
pub fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboard {
    pub user: PublicUser,
    pub stats: GlobalStats,
    pub classes: Vec<Classe>,
    pub unread: i64,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

impl AdminDashboard {
    pub fn ratio_label(&self) -> String {
        percent(self.stats.presence_ratio)
    }
}

#[derive(Template)]
#[template(path = "teacher_dashboard.html")]
pub struct TeacherDashboard {
    pub user: PublicUser,
    pub classes: Vec<Classe>,
    pub stats: TeacherStats,
    pub summary: TeacherSummary,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

impl TeacherDashboard {
    pub fn ratio_label(&self) -> String {
        percent(self.stats.ratio)
    }
}

#[derive(Template)]
#[template(path = "student_dashboard.html")]
pub struct StudentDashboard {
    pub user: PublicUser,
    // None enquanto o aluno não se inscrever
    pub profile: Option<Student>,
    pub presences: Vec<Presence>,
    pub classes: Vec<Classe>,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

impl StudentDashboard {
    pub fn present_count(&self) -> usize {
        self.presences
            .iter()
            .filter(|p| p.status == crate::models::presence::PresenceStatus::Present)
            .count()
    }
}

#[derive(Template)]
#[template(path = "class_page.html")]
pub struct ClassPage {
    pub user: PublicUser,
    pub classe: Classe,
    pub roster: Vec<RosterEntry>,
    // Registos do dia selecionado
    pub presences: Vec<Presence>,
    pub date: NaiveDate,
    pub success_message: Option<String>,
    pub error_message: Option<String>,
}

impl ClassPage {
    /// Estado já registado para um aluno no dia da página, se existir.
    pub fn status_of(&self, student_id: impl Borrow<i64>) -> String {
        let student_id = *student_id.borrow();
        self.presences
            .iter()
            .find(|p| p.student_id == student_id)
            .map(|p| p.status.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}
