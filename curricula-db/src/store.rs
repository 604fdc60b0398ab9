//! SQLite-backed implementations of the core store traits

use async_trait::async_trait;
use curricula_core::{
    NewPlan, PlanRecord, PlanShare, PlanStatus, PlanStore, Requirement, RequirementStore,
    ShareStore,
};

use crate::Database;

type CoreResult<T> = curricula_core::Result<T>;

/// Store handle over a shared connection pool
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PlanStore for SqliteStore {
    async fn load_plan_versions(&self, student_id: i64, program: &str) -> CoreResult<Vec<PlanRecord>> {
        Ok(self.db.plans().list_versions(student_id, program).await?)
    }

    async fn get_plan(&self, plan_id: i64) -> CoreResult<Option<PlanRecord>> {
        Ok(self.db.plans().get_by_id(plan_id).await?)
    }

    async fn list_plans(&self, offset: usize, limit: usize) -> CoreResult<Vec<PlanRecord>> {
        Ok(self.db.plans().list(offset, limit).await?)
    }

    async fn append_plan(&self, plan: NewPlan) -> CoreResult<PlanRecord> {
        Ok(self.db.plans().create(&plan).await?)
    }

    async fn set_status(
        &self,
        plan_id: i64,
        from: PlanStatus,
        to: PlanStatus,
    ) -> CoreResult<Option<PlanRecord>> {
        Ok(self.db.plans().update_status(plan_id, from, to).await?)
    }

    async fn delete_plan_cascade(&self, plan_id: i64) -> CoreResult<bool> {
        Ok(self.db.plans().delete_cascade(plan_id).await?)
    }
}

#[async_trait]
impl RequirementStore for SqliteStore {
    async fn get_requirement(&self, program: &str) -> CoreResult<Option<Requirement>> {
        Ok(self.db.requirements().get(program).await?)
    }

    async fn put_requirement(&self, requirement: Requirement) -> CoreResult<Requirement> {
        self.db.requirements().upsert(&requirement).await?;
        Ok(requirement)
    }

    async fn list_requirements(&self) -> CoreResult<Vec<Requirement>> {
        Ok(self.db.requirements().list().await?)
    }
}

#[async_trait]
impl ShareStore for SqliteStore {
    async fn save_share(&self, share: PlanShare) -> CoreResult<PlanShare> {
        self.db.shares().create(&share).await?;
        Ok(share)
    }

    async fn get_share(&self, token: &str) -> CoreResult<Option<PlanShare>> {
        Ok(self.db.shares().get(token).await?)
    }

    async fn list_shares(&self, plan_id: i64) -> CoreResult<Vec<PlanShare>> {
        Ok(self.db.shares().list_for_plan(plan_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curricula_core::{
        AccessLevel, ErrorKind, PlanDraft, PlanInput, PlanVersionManager, SemesterInput,
        ShareService, ValidationConfig,
    };
    use std::sync::Arc;
    use tempfile::TempDir;

    const CS: &str = "Computer Science";

    async fn setup() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path().join("test.db")).await.unwrap();
        db.catalog()
            .import(&[
                curricula_core::Course::new("CS101", "Intro to Programming", 3).core(),
                curricula_core::Course::new("CS201", "Data Structures", 4)
                    .with_prerequisites(["CS101"])
                    .core(),
                curricula_core::Course::new("ART100", "Drawing", 3),
            ])
            .await
            .unwrap();
        (db.store(), temp_dir)
    }

    async fn draft(store: &SqliteStore, student_id: i64) -> PlanDraft {
        let catalog = store.database().catalog().load_snapshot().await.unwrap();
        PlanInput {
            student_id,
            program: CS.to_string(),
            university: None,
            department: None,
            semesters: vec![
                SemesterInput {
                    name: "Fall".to_string(),
                    courses: vec!["CS101".to_string(), "ART100".to_string()],
                },
                SemesterInput {
                    name: "Spring".to_string(),
                    courses: vec!["CS201".to_string()],
                },
            ],
        }
        .resolve(&catalog)
        .unwrap()
    }

    #[tokio::test]
    async fn test_version_lifecycle_on_sqlite() {
        let (store, _temp) = setup().await;
        let manager = PlanVersionManager::new(store.clone(), ValidationConfig::default());

        let v1 = manager.create(draft(&store, 7).await).await.unwrap();
        let v2 = manager.update(v1.id, draft(&store, 7).await).await.unwrap();
        let v3 = manager.restore(7, CS, 1).await.unwrap();
        assert_eq!((v1.version, v2.version, v3.version), (1, 2, 3));

        manager.approve(v3.id).await.unwrap();
        assert_eq!(
            manager.reject(v3.id).await.unwrap_err().kind(),
            ErrorKind::InvalidStatusTransition
        );

        let versions = manager.list_versions(7, CS).await.unwrap();
        assert_eq!(versions.iter().map(|p| p.version).collect::<Vec<_>>(), vec![3, 2, 1]);

        manager.delete(v2.id).await.unwrap();
        let next = manager.create(draft(&store, 7).await).await.unwrap();
        assert_eq!(next.version, 4);
    }

    #[tokio::test]
    async fn test_concurrent_creates_on_sqlite() {
        let (store, _temp) = setup().await;
        let manager = Arc::new(PlanVersionManager::new(
            store.clone(),
            ValidationConfig::default(),
        ));
        let content = draft(&store, 7).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            let content = content.clone();
            handles.push(tokio::spawn(async move { manager.create(content).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut versions: Vec<u32> = manager
            .list_versions(7, CS)
            .await
            .unwrap()
            .iter()
            .map(|p| p.version)
            .collect();
        versions.sort_unstable();
        assert_eq!(versions, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_across_database_handles() {
        let (store, temp) = setup().await;
        let path = temp.path().join("test.db");
        let other = Database::open(&path).await.unwrap().store();
        let content = draft(&store, 7).await;

        let managers = [
            Arc::new(PlanVersionManager::new(store.clone(), ValidationConfig::default())),
            Arc::new(PlanVersionManager::new(other, ValidationConfig::default())),
        ];

        let mut handles = Vec::new();
        for i in 0..16 {
            let manager = Arc::clone(&managers[i % 2]);
            let content = content.clone();
            handles.push(tokio::spawn(async move { manager.create(content).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut versions: Vec<u32> = managers[0]
            .list_versions(7, CS)
            .await
            .unwrap()
            .iter()
            .map(|p| p.version)
            .collect();
        versions.sort_unstable();
        assert_eq!(versions, (1..=16).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_approve_and_reject_across_database_handles() {
        let (store, temp) = setup().await;
        let other = Database::open(temp.path().join("test.db")).await.unwrap().store();
        let first = PlanVersionManager::new(store.clone(), ValidationConfig::default());
        let plan = first.create(draft(&store, 7).await).await.unwrap();
        let second = PlanVersionManager::new(other, ValidationConfig::default());

        let (approved, rejected) = tokio::join!(first.approve(plan.id), second.reject(plan.id));
        assert!(approved.is_ok() != rejected.is_ok());
        let loser = approved.err().or(rejected.err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::InvalidStatusTransition);
    }

    #[tokio::test]
    async fn test_requirements_and_shares_on_sqlite() {
        let (store, _temp) = setup().await;
        let manager = PlanVersionManager::new(store.clone(), ValidationConfig::default());
        let plan = manager.create(draft(&store, 7).await).await.unwrap();

        store
            .put_requirement(Requirement {
                program: CS.to_string(),
                total_hours: 12,
                num_core_courses: 2,
                num_elective_courses: 1,
            })
            .await
            .unwrap();
        let report = manager.requirements_fulfillment(plan.id).await.unwrap();
        assert_eq!(report.fulfilled.len(), 2);
        assert_eq!(report.unfulfilled.len(), 1);
        assert_eq!(store.list_requirements().await.unwrap().len(), 1);

        let sharing = ShareService::new(store.clone(), None);
        let share = sharing
            .create_share(plan.id, AccessLevel::View, None)
            .await
            .unwrap();
        let opened = sharing
            .open_share(&share.token, chrono::Utc::now())
            .await
            .unwrap();
        assert_eq!(opened.plan.id, plan.id);
        let listed = sharing.list_shares(plan.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].token, share.token);

        manager.delete(plan.id).await.unwrap();
        assert_eq!(
            sharing
                .open_share(&share.token, chrono::Utc::now())
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
    }
}
