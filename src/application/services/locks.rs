use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::ids::ProjectId;

type LockTable = Arc<Mutex<HashMap<ProjectId, Arc<AsyncMutex<()>>>>>;

/// One async mutex per project, created on demand and discarded once nobody
/// holds or waits for it.
#[derive(Clone, Default)]
pub struct ProjectLocks {
    table: LockTable,
}

pub struct ProjectLockGuard {
    project_id: ProjectId,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, project_id: ProjectId) -> ProjectLockGuard {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(project_id).or_default())
        };
        let guard = mutex.lock_owned().await;

        ProjectLockGuard {
            project_id,
            table: Arc::clone(&self.table),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for ProjectLockGuard {
    fn drop(&mut self) {
        // Release first so the table holds the only remaining reference.
        drop(self.guard.take());

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table
            .get(&self.project_id)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1)
        {
            table.remove(&self.project_id);
        }
    }
}
