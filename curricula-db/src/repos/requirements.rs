//! Program requirement repository

use curricula_core::Requirement;
use sqlx::{FromRow, SqlitePool};

use crate::error::{to_u32, Result};

#[derive(Debug, FromRow)]
struct RequirementRow {
    program: String,
    total_hours: i64,
    num_core_courses: i64,
    num_elective_courses: i64,
}

impl TryFrom<RequirementRow> for Requirement {
    type Error = crate::Error;

    fn try_from(row: RequirementRow) -> Result<Self> {
        Ok(Requirement {
            program: row.program,
            total_hours: to_u32("total_hours", row.total_hours)?,
            num_core_courses: to_u32("num_core_courses", row.num_core_courses)?,
            num_elective_courses: to_u32("num_elective_courses", row.num_elective_courses)?,
        })
    }
}

pub struct RequirementRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RequirementRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, program: &str) -> Result<Option<Requirement>> {
        sqlx::query_as::<_, RequirementRow>("SELECT * FROM requirements WHERE program = ?")
            .bind(program)
            .fetch_optional(self.pool)
            .await?
            .map(Requirement::try_from)
            .transpose()
    }

    /// Insert or replace the requirement for a program
    pub async fn upsert(&self, requirement: &Requirement) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO requirements (program, total_hours, num_core_courses, num_elective_courses)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(program) DO UPDATE SET
                total_hours = excluded.total_hours,
                num_core_courses = excluded.num_core_courses,
                num_elective_courses = excluded.num_elective_courses
            "#,
        )
        .bind(&requirement.program)
        .bind(i64::from(requirement.total_hours))
        .bind(i64::from(requirement.num_core_courses))
        .bind(i64::from(requirement.num_elective_courses))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Requirement>> {
        sqlx::query_as::<_, RequirementRow>("SELECT * FROM requirements ORDER BY program")
            .fetch_all(self.pool)
            .await?
            .into_iter()
            .map(Requirement::try_from)
            .collect()
    }
}
