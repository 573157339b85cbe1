// src/models/stats.rs
use serde::Serialize;
use sqlx::FromRow;

/// present / (present + absent), 0 quando não há registos.
pub fn ratio(present: i64, absent: i64) -> f64 {
    let total = present + absent;
    if total > 0 {
        present as f64 / total as f64
    } else {
        0.0
    }
}

/// Contagens de uma turma (linha lida da agregação SQL).
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RoomStats {
    pub class_id: i64,
    pub room: String,
    pub presences: i64,
    pub absences: i64,
}

/// Estatísticas globais (admin).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_presences: i64,
    pub total_absences: i64,
    pub presence_ratio: f64,
    pub by_room: Vec<RoomStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStats {
    pub class_id: i64,
    pub class_name: String,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub ratio: f64,
}

impl From<RoomStats> for ClassStats {
    fn from(room: RoomStats) -> Self {
        ClassStats {
            class_id: room.class_id,
            class_name: room.room,
            total: room.presences + room.absences,
            present: room.presences,
            absent: room.absences,
            ratio: ratio(room.presences, room.absences),
        }
    }
}

/// Estatísticas das turmas de um professor, com o total agregado.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherStats {
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub ratio: f64,
    pub by_class: Vec<ClassStats>,
}

impl TeacherStats {
    pub fn rollup(by_class: Vec<ClassStats>) -> Self {
        let present: i64 = by_class.iter().map(|c| c.present).sum();
        let absent: i64 = by_class.iter().map(|c| c.absent).sum();
        TeacherStats {
            total: present + absent,
            present,
            absent,
            ratio: ratio(present, absent),
            by_class,
        }
    }
}

/// Resumo do painel do professor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeacherSummary {
    pub classes: i64,
    pub students: i64,
    pub recent_presences: i64,
}
