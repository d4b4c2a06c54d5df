//! The task scheduler (§4.9): a cron-driven task registry over
//! `tokio-cron-scheduler`, with single-flight execution per task and a
//! manual trigger.
//!
//! Grounded in `src/services/workflow.rs`'s `WorkflowManager` —
//! `Arc<RwLock<HashMap<Uuid, _>>>` state tracking plus a
//! mark-running/run/record-completion wrapper — adapted here from ad hoc
//! workflow executions to named, re-registrable cron jobs. The cron
//! engine itself (`tokio-cron-scheduler`) is an enrichment dependency:
//! the teacher has no cron/scheduling crate anywhere in its workspace.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use radarr_core::{RadarrError, Result};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
pub type TaskFn = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// Public view of a registered task, per §4.9's `{id, name, cron,
/// lastRun, nextRun, running}`.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: Uuid,
    pub name: String,
    pub cron: String,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub running: bool,
}

struct RegisteredTask {
    name: String,
    cron: String,
    func: TaskFn,
    job_id: Uuid,
    running: Arc<AtomicBool>,
    last_run: Arc<RwLock<Option<DateTime<Utc>>>>,
}

/// Owns the cron engine and the id -> task map, per §4.9. Single-flight
/// per task is enforced by `running`, an `AtomicBool` captured by the
/// scheduled closure and checked again by `run_now`.
pub struct TaskRegistry {
    scheduler: JobScheduler,
    tasks: RwLock<HashMap<Uuid, RegisteredTask>>,
}

impl TaskRegistry {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| RadarrError::ConfigurationError { field: "scheduler".to_string(), message: e.to_string() })?;
        Ok(Self { scheduler, tasks: RwLock::new(HashMap::new()) })
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| RadarrError::ConfigurationError { field: "scheduler".to_string(), message: e.to_string() })
    }

    /// `RegisterTask({id, name, cron, runOnStart, func})`. Returns the
    /// task's id, generated here rather than supplied by the caller.
    pub async fn register_task(&self, name: &str, cron: &str, run_on_start: bool, func: TaskFn) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let running = Arc::new(AtomicBool::new(false));
        let last_run = Arc::new(RwLock::new(None));

        let job_func = func.clone();
        let job_running = running.clone();
        let job_last_run = last_run.clone();
        let job_name = name.to_string();

        let job = Job::new_async(cron, move |_job_id, _scheduler| {
            let func = job_func.clone();
            let running = job_running.clone();
            let last_run = job_last_run.clone();
            let name = job_name.clone();
            Box::pin(async move {
                run_guarded(&name, &running, &last_run, func).await;
            })
        })
        .map_err(|e| RadarrError::ConfigurationError { field: "cron".to_string(), message: e.to_string() })?;

        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| RadarrError::ConfigurationError { field: "cron".to_string(), message: e.to_string() })?;

        self.tasks.write().await.insert(
            id,
            RegisteredTask { name: name.to_string(), cron: cron.to_string(), func: func.clone(), job_id, running, last_run },
        );

        info!(task = %name, cron, "registered scheduled task");

        if run_on_start {
            self.run_now(id).await?;
        }

        Ok(id)
    }

    /// `RunNow(id)` — refuses if the task is already running.
    pub async fn run_now(&self, id: Uuid) -> Result<()> {
        let tasks = self.tasks.read().await;
        let task = tasks.get(&id).ok_or_else(|| RadarrError::NotFound { resource: format!("task {id}") })?;

        if task.running.load(Ordering::SeqCst) {
            warn!(task = %task.name, "run_now refused, already running");
            return Err(RadarrError::ValidationError {
                field: "task".to_string(),
                message: format!("task '{}' is already running", task.name),
            });
        }

        let func = task.func.clone();
        let running = task.running.clone();
        let last_run = task.last_run.clone();
        let name = task.name.clone();
        drop(tasks);

        run_guarded(&name, &running, &last_run, func).await;
        Ok(())
    }

    /// `ListTasks` / `GetTask`.
    pub async fn list_tasks(&self) -> Vec<TaskInfo> {
        let tasks = self.tasks.read().await;
        let mut out = Vec::with_capacity(tasks.len());
        for (id, task) in tasks.iter() {
            out.push(self.task_info(*id, task).await);
        }
        out
    }

    pub async fn get_task(&self, id: Uuid) -> Option<TaskInfo> {
        let tasks = self.tasks.read().await;
        let task = tasks.get(&id)?;
        Some(self.task_info(id, task).await)
    }

    async fn task_info(&self, id: Uuid, task: &RegisteredTask) -> TaskInfo {
        let next_run = self.scheduler.next_tick_for_job(task.job_id).await.ok().flatten();
        TaskInfo {
            id,
            name: task.name.clone(),
            cron: task.cron.clone(),
            last_run: *task.last_run.read().await,
            next_run,
            running: task.running.load(Ordering::SeqCst),
        }
    }

    /// `UnregisterTask` — the mechanism for applying a changed schedule:
    /// callers unregister then re-register with the new cron string.
    pub async fn unregister_task(&self, id: Uuid) -> Result<()> {
        let job_id = {
            let mut tasks = self.tasks.write().await;
            let task = tasks.remove(&id).ok_or_else(|| RadarrError::NotFound { resource: format!("task {id}") })?;
            task.job_id
        };
        self.scheduler
            .remove(&job_id)
            .await
            .map_err(|e| RadarrError::ConfigurationError { field: "cron".to_string(), message: e.to_string() })
    }
}

async fn run_guarded(name: &str, running: &AtomicBool, last_run: &RwLock<Option<DateTime<Utc>>>, func: TaskFn) {
    if running.swap(true, Ordering::SeqCst) {
        debug!(task = name, "tick skipped, previous run still in flight");
        return;
    }
    let result = func().await;
    *last_run.write().await = Some(Utc::now());
    running.store(false, Ordering::SeqCst);
    match result {
        Ok(()) => debug!(task = name, "task run completed"),
        Err(e) => error!(task = name, error = %e, "task run failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn run_now_refuses_while_running() {
        let registry = TaskRegistry::new().await.unwrap();
        let gate = Arc::new(tokio::sync::Notify::new());
        let gate_clone = gate.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let id = registry
            .register_task("slow-task", "0 0 0 * * * *", false, Arc::new(move || {
                let gate = gate_clone.clone();
                let calls = calls_clone.clone();
                Box::pin(async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    gate.notified().await;
                    Ok(())
                })
            }))
            .await
            .unwrap();

        let registry = Arc::new(registry);
        let r2 = registry.clone();
        let first = tokio::spawn(async move { r2.run_now(id).await });
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let second = registry.run_now(id).await;
        assert!(second.is_err());

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn list_tasks_reports_registration() {
        let registry = TaskRegistry::new().await.unwrap();
        let id = registry
            .register_task("noop", "0 0 0 * * * *", false, Arc::new(|| Box::pin(async { Ok(()) })))
            .await
            .unwrap();
        let tasks = registry.list_tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, id);
        assert!(!tasks[0].running);
    }
}
