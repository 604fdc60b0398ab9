//! Course catalog repository

use std::collections::HashMap;

use curricula_core::{CatalogSnapshot, Course};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::info;

use crate::error::{to_u32, Error, Result};

#[derive(Debug, FromRow)]
struct CourseRow {
    course_id: String,
    title: String,
    credits: i64,
    is_core: bool,
    level: Option<i64>,
    description: Option<String>,
    department: Option<String>,
    instructor: Option<String>,
}

impl CourseRow {
    fn into_course(self, prerequisites: Vec<String>, categories: Vec<String>) -> Result<Course> {
        Ok(Course {
            course_id: self.course_id,
            title: self.title,
            credits: to_u32("credits", self.credits)?,
            prerequisites,
            categories,
            is_core: self.is_core,
            level: self.level.map(|l| to_u32("level", l)).transpose()?,
            description: self.description,
            department: self.department,
            instructor: self.instructor,
        })
    }
}

/// Repository for courses and their prerequisite edges
pub struct CatalogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a course with its edges and categories
    pub async fn upsert(&self, course: &Course) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        write_course(&mut tx, course).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Insert or replace many courses in one transaction
    pub async fn import(&self, courses: &[Course]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for course in courses {
            write_course(&mut tx, course).await?;
        }
        tx.commit().await?;

        info!(count = courses.len(), "Imported catalog courses");
        Ok(courses.len())
    }

    pub async fn get(&self, course_id: &str) -> Result<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE course_id = ?")
            .bind(course_id)
            .fetch_optional(self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let prerequisites: Vec<String> = sqlx::query_scalar(
            "SELECT prerequisite_id FROM course_prerequisites WHERE course_id = ? ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(self.pool)
        .await?;

        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT category FROM course_categories WHERE course_id = ? ORDER BY category",
        )
        .bind(course_id)
        .fetch_all(self.pool)
        .await?;

        row.into_course(prerequisites, categories).map(Some)
    }

    /// Delete a course; edges pointing at it from other courses are kept
    pub async fn delete(&self, course_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        delete_edges(&mut tx, course_id).await?;
        let result = sqlx::query("DELETE FROM courses WHERE course_id = ?")
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// All courses ordered by id
    pub async fn list(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query_as::<_, CourseRow>("SELECT * FROM courses ORDER BY course_id")
            .fetch_all(self.pool)
            .await?;

        let mut prerequisites: HashMap<String, Vec<String>> = HashMap::new();
        let edges = sqlx::query_as::<_, (String, String)>(
            "SELECT course_id, prerequisite_id FROM course_prerequisites ORDER BY course_id, position",
        )
        .fetch_all(self.pool)
        .await?;
        for (course_id, prerequisite_id) in edges {
            prerequisites.entry(course_id).or_default().push(prerequisite_id);
        }

        let mut categories: HashMap<String, Vec<String>> = HashMap::new();
        let tags = sqlx::query_as::<_, (String, String)>(
            "SELECT course_id, category FROM course_categories ORDER BY course_id, category",
        )
        .fetch_all(self.pool)
        .await?;
        for (course_id, category) in tags {
            categories.entry(course_id).or_default().push(category);
        }

        rows.into_iter()
            .map(|row| {
                let edges = prerequisites.remove(&row.course_id).unwrap_or_default();
                let tags = categories.remove(&row.course_id).unwrap_or_default();
                row.into_course(edges, tags)
            })
            .collect()
    }

    /// Load the whole catalog into memory
    pub async fn load_snapshot(&self) -> Result<CatalogSnapshot> {
        Ok(self.list().await?.into_iter().collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

async fn delete_edges(tx: &mut Transaction<'_, Sqlite>, course_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM course_prerequisites WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM course_categories WHERE course_id = ?")
        .bind(course_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn write_course(tx: &mut Transaction<'_, Sqlite>, course: &Course) -> Result<()> {
    course
        .check()
        .map_err(|e| Error::InvalidData(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO courses (
            course_id, title, credits, is_core, level, description, department, instructor
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(course_id) DO UPDATE SET
            title = excluded.title,
            credits = excluded.credits,
            is_core = excluded.is_core,
            level = excluded.level,
            description = excluded.description,
            department = excluded.department,
            instructor = excluded.instructor
        "#,
    )
    .bind(&course.course_id)
    .bind(&course.title)
    .bind(i64::from(course.credits))
    .bind(course.is_core)
    .bind(course.level.map(i64::from))
    .bind(&course.description)
    .bind(&course.department)
    .bind(&course.instructor)
    .execute(&mut **tx)
    .await?;

    delete_edges(tx, &course.course_id).await?;

    for (position, prerequisite) in course.prerequisites.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO course_prerequisites (course_id, prerequisite_id, position) VALUES (?, ?, ?)",
        )
        .bind(&course.course_id)
        .bind(prerequisite)
        .bind(position as i64)
        .execute(&mut **tx)
        .await?;
    }

    for category in &course.categories {
        sqlx::query("INSERT OR IGNORE INTO course_categories (course_id, category) VALUES (?, ?)")
            .bind(&course.course_id)
            .bind(category)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use curricula_core::{resolve, Catalog};
    use tempfile::TempDir;

    async fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path().join("test.db")).await.unwrap();
        (db, temp_dir)
    }

    #[tokio::test]
    async fn test_upsert_and_get_course() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.catalog();

        let mut course = Course::new("CS201", "Data Structures", 4)
            .with_prerequisites(["CS101", "MATH101"])
            .with_categories(["programming"])
            .with_level(200);
        course.instructor = Some("Dr. Hopper".to_string());
        repo.upsert(&course).await.unwrap();

        let fetched = repo.get("CS201").await.unwrap().unwrap();
        assert_eq!(fetched, course);
        assert!(repo.get("CS999").await.unwrap().is_none());

        let changed = Course::new("CS201", "Data Structures II", 3).with_prerequisites(["CS102"]);
        repo.upsert(&changed).await.unwrap();
        assert_eq!(repo.get("CS201").await.unwrap().unwrap(), changed);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_course_rejected() {
        let (db, _temp) = setup_test_db().await;
        let err = db
            .catalog()
            .upsert(&Course::new("CS000", "Nothing", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_snapshot_keeps_cycles_and_dangling_edges() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.catalog();
        repo.import(&[
            Course::new("A", "A", 3).with_prerequisites(["B"]),
            Course::new("B", "B", 3).with_prerequisites(["A", "GHOST"]),
        ])
        .await
        .unwrap();

        let snapshot = repo.load_snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.prerequisite_edges("B"), ["A", "GHOST"]);

        let report = snapshot.integrity_report();
        assert_eq!(report.dangling.len(), 1);
        assert_eq!(report.cycles.len(), 1);

        let tree = resolve(&snapshot, "A").unwrap();
        assert_eq!(tree.prerequisites[0].course_id, "B");
    }

    #[tokio::test]
    async fn test_delete_keeps_inbound_edges() {
        let (db, _temp) = setup_test_db().await;
        let repo = db.catalog();
        repo.import(&[
            Course::new("CS101", "Intro", 3),
            Course::new("CS201", "Data Structures", 4).with_prerequisites(["CS101"]),
        ])
        .await
        .unwrap();

        assert!(repo.delete("CS101").await.unwrap());
        assert!(!repo.delete("CS101").await.unwrap());

        let remaining = repo.get("CS201").await.unwrap().unwrap();
        assert_eq!(remaining.prerequisites, vec!["CS101"]);
    }
}
