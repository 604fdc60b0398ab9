//! Academic plan repository
//!
//! A plan spans three tables: `plans` holds the version row, `semesters`
//! the ordered terms and `plan_courses` the ordered course copies.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use curricula_core::{NewPlan, PlanRecord, PlanStatus, PlannedCourse, Semester};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{to_u32, Error, Result};

#[derive(Debug, FromRow)]
struct PlanRow {
    id: i64,
    student_id: i64,
    program: String,
    university: Option<String>,
    department: Option<String>,
    version: i64,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct SemesterRow {
    id: i64,
    name: String,
}

#[derive(Debug, FromRow)]
struct PlanCourseRow {
    semester_id: i64,
    course_id: String,
    title: String,
    credits: i64,
    prerequisites_json: String,
    is_core: bool,
    level: Option<i64>,
    department: Option<String>,
    description: Option<String>,
    instructor: Option<String>,
}

impl PlanCourseRow {
    fn into_course(self) -> Result<PlannedCourse> {
        Ok(PlannedCourse {
            course_id: self.course_id,
            title: self.title,
            credits: to_u32("credits", self.credits)?,
            prerequisites: serde_json::from_str(&self.prerequisites_json)?,
            is_core: self.is_core,
            level: self.level.map(|l| to_u32("level", l)).transpose()?,
            department: self.department,
            description: self.description,
            instructor: self.instructor,
        })
    }
}

/// Repository for plan versions with their semesters and courses
pub struct PlanRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PlanRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a plan as the next version for its student and program
    ///
    /// The plan row, its semesters and courses are written in one
    /// transaction. The version is `MAX(version) + 1` computed by the INSERT
    /// itself, so it is read under the database write lock and two
    /// connections, or two processes, never allocate the same number.
    pub async fn create(&self, plan: &NewPlan) -> Result<PlanRecord> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let (plan_id, version): (i64, i64) = sqlx::query_as(
            r#"
            INSERT INTO plans (student_id, program, university, department, version, status, created_at)
            SELECT ?, ?, ?, ?, COALESCE(MAX(version), 0) + 1, ?, ?
            FROM plans
            WHERE student_id = ? AND program = ?
            RETURNING id, version
            "#,
        )
        .bind(plan.student_id)
        .bind(&plan.program)
        .bind(&plan.university)
        .bind(&plan.department)
        .bind(plan.status.as_str())
        .bind(now)
        .bind(plan.student_id)
        .bind(&plan.program)
        .fetch_one(&mut *tx)
        .await?;

        for (position, semester) in plan.semesters.iter().enumerate() {
            let semester_id = sqlx::query(
                "INSERT INTO semesters (plan_id, position, name) VALUES (?, ?, ?)",
            )
            .bind(plan_id)
            .bind(position as i64)
            .bind(&semester.name)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            for (position, course) in semester.courses.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO plan_courses (
                        semester_id, position, course_id, title, credits, prerequisites_json,
                        is_core, level, department, description, instructor
                    )
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(semester_id)
                .bind(position as i64)
                .bind(&course.course_id)
                .bind(&course.title)
                .bind(i64::from(course.credits))
                .bind(serde_json::to_string(&course.prerequisites)?)
                .bind(course.is_core)
                .bind(course.level.map(i64::from))
                .bind(&course.department)
                .bind(&course.description)
                .bind(&course.instructor)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        debug!(plan_id, version, "Inserted plan rows");

        self.get_by_id(plan_id)
            .await?
            .ok_or_else(|| Error::InvalidData(format!("plan {} vanished after insert", plan_id)))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<PlanRecord>> {
        let row = sqlx::query_as::<_, PlanRow>("SELECT * FROM plans WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => self.hydrate(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Every version for a student and program, oldest first
    pub async fn list_versions(&self, student_id: i64, program: &str) -> Result<Vec<PlanRecord>> {
        let rows = sqlx::query_as::<_, PlanRow>(
            "SELECT * FROM plans WHERE student_id = ? AND program = ? ORDER BY version ASC",
        )
        .bind(student_id)
        .bind(program)
        .fetch_all(self.pool)
        .await?;

        self.hydrate_all(rows).await
    }

    /// Plans ordered by id
    pub async fn list(&self, offset: usize, limit: usize) -> Result<Vec<PlanRecord>> {
        let rows = sqlx::query_as::<_, PlanRow>("SELECT * FROM plans ORDER BY id LIMIT ? OFFSET ?")
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(self.pool)
            .await?;

        self.hydrate_all(rows).await
    }

    /// Set the status only while the row still has status `from`
    ///
    /// Returns `None` when the plan is missing or its status has moved on.
    pub async fn update_status(
        &self,
        id: i64,
        from: PlanStatus,
        to: PlanStatus,
    ) -> Result<Option<PlanRecord>> {
        let result = sqlx::query("UPDATE plans SET status = ? WHERE id = ? AND status = ?")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Delete courses, then semesters, then shares, then the plan row
    pub async fn delete_cascade(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM plan_courses WHERE semester_id IN (SELECT id FROM semesters WHERE plan_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM semesters WHERE plan_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM plan_shares WHERE plan_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM plans WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn hydrate_all(&self, rows: Vec<PlanRow>) -> Result<Vec<PlanRecord>> {
        let mut plans = Vec::with_capacity(rows.len());
        for row in rows {
            plans.push(self.hydrate(row).await?);
        }
        Ok(plans)
    }

    async fn hydrate(&self, row: PlanRow) -> Result<PlanRecord> {
        let semester_rows = sqlx::query_as::<_, SemesterRow>(
            "SELECT id, name FROM semesters WHERE plan_id = ? ORDER BY position",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        let course_rows = sqlx::query_as::<_, PlanCourseRow>(
            r#"
            SELECT pc.semester_id, pc.course_id, pc.title, pc.credits,
                   pc.prerequisites_json, pc.is_core, pc.level, pc.department,
                   pc.description, pc.instructor
            FROM plan_courses pc
            INNER JOIN semesters s ON s.id = pc.semester_id
            WHERE s.plan_id = ?
            ORDER BY s.position, pc.position
            "#,
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        let mut courses: HashMap<i64, Vec<PlannedCourse>> = HashMap::new();
        for course in course_rows {
            let semester_id = course.semester_id;
            courses
                .entry(semester_id)
                .or_default()
                .push(course.into_course()?);
        }

        let semesters = semester_rows
            .into_iter()
            .map(|s| Semester::new(s.name, courses.remove(&s.id).unwrap_or_default()))
            .collect();

        Ok(PlanRecord {
            id: row.id,
            student_id: row.student_id,
            program: row.program,
            university: row.university,
            department: row.department,
            version: to_u32("version", row.version)?,
            status: row
                .status
                .parse()
                .map_err(|e: curricula_core::Error| Error::InvalidData(e.to_string()))?,
            created_at: row.created_at,
            semesters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path().join("test.db")).await.unwrap();
        (db, temp_dir)
    }

    fn new_plan(student_id: i64) -> NewPlan {
        let mut calculus = PlannedCourse::new("MATH101", 4);
        calculus.description = Some("Limits and derivatives".to_string());
        calculus.instructor = Some("Dr. Noether".to_string());

        NewPlan {
            student_id,
            program: "Computer Science".to_string(),
            university: Some("State".to_string()),
            department: None,
            status: PlanStatus::Pending,
            semesters: vec![
                Semester::new("Fall", vec![PlannedCourse::new("CS101", 3).core(), calculus]),
                Semester::new(
                    "Spring",
                    vec![PlannedCourse::new("CS201", 4).with_prerequisites(["CS101", "MATH101"])],
                ),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_and_get_plan() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.plans();

        let plan = repo.create(&new_plan(7)).await.unwrap();
        assert_eq!(plan.version, 1);
        assert_eq!(plan.status, PlanStatus::Pending);
        assert_eq!(plan.total_credits(), 11);

        let fetched = repo.get_by_id(plan.id).await.unwrap().unwrap();
        assert_eq!(fetched, plan);
        assert_eq!(fetched.semesters[0].name, "Fall");

        let calculus = &fetched.semesters[0].courses[1];
        assert_eq!(calculus.course_id, "MATH101");
        assert_eq!(calculus.description.as_deref(), Some("Limits and derivatives"));
        assert_eq!(calculus.instructor.as_deref(), Some("Dr. Noether"));
        assert_eq!(
            fetched.semesters[1].courses[0].prerequisites,
            vec!["CS101", "MATH101"]
        );
        assert!(repo.get_by_id(plan.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_allocates_next_version_per_key() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.plans();

        assert_eq!(repo.create(&new_plan(7)).await.unwrap().version, 1);
        let second = repo.create(&new_plan(7)).await.unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(repo.create(&new_plan(8)).await.unwrap().version, 1);

        let mut other_program = new_plan(7);
        other_program.program = "Mathematics".to_string();
        assert_eq!(repo.create(&other_program).await.unwrap().version, 1);

        // Deleting the newest version leaves its number free for reuse
        assert!(repo.delete_cascade(second.id).await.unwrap());
        assert_eq!(repo.create(&new_plan(7)).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_duplicate_version_violates_unique_index() {
        let (db, _temp) = setup_test_db().await;
        let plan = db.plans().create(&new_plan(7)).await.unwrap();

        let duplicate = sqlx::query(
            r#"
            INSERT INTO plans (student_id, program, version, status, created_at)
            VALUES (?, ?, ?, 'PENDING', ?)
            "#,
        )
        .bind(plan.student_id)
        .bind(&plan.program)
        .bind(i64::from(plan.version))
        .bind(Utc::now())
        .execute(db.pool())
        .await;
        assert!(duplicate.is_err());
        assert_eq!(db.plans().list(0, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_versions_and_paging() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.plans();

        repo.create(&new_plan(7)).await.unwrap();
        repo.create(&new_plan(8)).await.unwrap();
        repo.create(&new_plan(7)).await.unwrap();

        let versions = repo.list_versions(7, "Computer Science").await.unwrap();
        assert_eq!(versions.iter().map(|p| p.version).collect::<Vec<_>>(), vec![1, 2]);

        let page = repo.list(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].version, 1);
        assert_eq!(page[0].student_id, 8);
    }

    #[tokio::test]
    async fn test_update_status_only_from_expected() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.plans();
        let plan = repo.create(&new_plan(7)).await.unwrap();

        let updated = repo
            .update_status(plan.id, PlanStatus::Pending, PlanStatus::Approved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, PlanStatus::Approved);

        // Already moved on, the second writer changes nothing
        assert!(repo
            .update_status(plan.id, PlanStatus::Pending, PlanStatus::Rejected)
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            repo.get_by_id(plan.id).await.unwrap().unwrap().status,
            PlanStatus::Approved
        );

        assert!(repo
            .update_status(999, PlanStatus::Pending, PlanStatus::Approved)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_cascade() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.plans();
        let plan = repo.create(&new_plan(7)).await.unwrap();
        let kept = repo.create(&new_plan(7)).await.unwrap();

        assert!(repo.delete_cascade(plan.id).await.unwrap());
        assert!(!repo.delete_cascade(plan.id).await.unwrap());

        let (orphans,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM semesters WHERE plan_id = ?",
        )
        .bind(plan.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(orphans, 0);

        assert_eq!(repo.get_by_id(kept.id).await.unwrap().unwrap().semesters.len(), 2);
    }
}
