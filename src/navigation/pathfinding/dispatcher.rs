//! Asynchronous path requests served by a worker pool.
//!
//! Requests go onto a job channel shared by the workers. Each worker runs
//! the search and pushes the response (with the caller's handler) onto a
//! result channel. Nothing is delivered until the owner calls
//! [`PathDispatcher::drain_completed_requests`], which invokes the handlers
//! on the calling thread in the order the responses arrived.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bevy::log::{debug, info, warn};
use bevy::math::Vec3;
use bevy::prelude::Resource;
use crossbeam_channel::{select, unbounded, Receiver, Sender, TryRecvError};

use crate::navigation::config::DispatcherConfig;
use crate::navigation::error::DispatchError;
use crate::navigation::structures::CostGrid;
use super::astar::find_path;
use super::types::{PathCallback, PathRequest, PathResponse, SearchResult};

/// Anything that can answer a path query. Shared by all workers.
pub trait PathPlanner: Send + Sync + 'static {
    fn plan(&self, start: Vec3, goal: Vec3) -> SearchResult;
}

impl PathPlanner for CostGrid {
    fn plan(&self, start: Vec3, goal: Vec3) -> SearchResult {
        find_path(self, start, goal)
    }
}

/// Cloneable submission handle. Safe to hand to other threads.
#[derive(Clone)]
pub struct PathRequester {
    jobs: Sender<PathRequest>,
    pending: Arc<AtomicUsize>,
    backlog_warning: usize,
    backlog_warnings: Arc<AtomicUsize>,
}

impl PathRequester {
    /// Queue a search. `on_complete` runs later, during a drain, exactly once.
    pub fn request_path(
        &self,
        start: Vec3,
        goal: Vec3,
        on_complete: impl FnOnce(&[Vec3], bool) + Send + 'static,
    ) -> Result<(), DispatchError> {
        self.submit(PathRequest {
            start,
            goal,
            on_complete: Box::new(on_complete) as PathCallback,
        })
    }

    pub fn submit(&self, request: PathRequest) -> Result<(), DispatchError> {
        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        if self.jobs.send(request).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(DispatchError::Closed);
        }

        if pending == self.backlog_warning + 1 {
            self.backlog_warnings.fetch_add(1, Ordering::Relaxed);
            warn!(
                "Path request backlog exceeded {} outstanding requests",
                self.backlog_warning
            );
        }
        Ok(())
    }

    /// Submitted but not yet delivered by a drain.
    pub fn pending_requests(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// How many times the backlog warning has fired.
    pub fn backlog_warnings(&self) -> usize {
        self.backlog_warnings.load(Ordering::Relaxed)
    }
}

/// Owner of the worker pool and the result channel.
///
/// Dropping the dispatcher stops the workers and joins them. Jobs still
/// waiting in the queue are discarded without invoking their handlers.
#[derive(Resource)]
pub struct PathDispatcher {
    requester: PathRequester,
    results: Receiver<PathResponse>,
    shutdown: Option<Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl PathDispatcher {
    pub fn spawn(
        planner: Arc<dyn PathPlanner>,
        config: &DispatcherConfig,
    ) -> Result<Self, DispatchError> {
        let (job_tx, job_rx) = unbounded::<PathRequest>();
        let (result_tx, result_rx) = unbounded::<PathResponse>();
        let (shutdown_tx, shutdown_rx) = unbounded::<()>();

        let thread_count = config.resolved_worker_threads();
        let mut workers = Vec::with_capacity(thread_count);

        for index in 0..thread_count {
            let planner = planner.clone();
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let shutdown = shutdown_rx.clone();

            let handle = thread::Builder::new()
                .name(format!("path-worker-{}", index))
                .spawn(move || worker_loop(index, planner, jobs, results, shutdown))
                .map_err(|source| DispatchError::Spawn { index, source })?;
            workers.push(handle);
        }

        info!("Path dispatcher started with {} worker(s)", thread_count);

        Ok(Self {
            requester: PathRequester {
                jobs: job_tx,
                pending: Arc::new(AtomicUsize::new(0)),
                backlog_warning: config.backlog_warning,
                backlog_warnings: Arc::new(AtomicUsize::new(0)),
            },
            results: result_rx,
            shutdown: Some(shutdown_tx),
            workers,
        })
    }

    /// See [`PathRequester::request_path`].
    pub fn request_path(
        &self,
        start: Vec3,
        goal: Vec3,
        on_complete: impl FnOnce(&[Vec3], bool) + Send + 'static,
    ) -> Result<(), DispatchError> {
        self.requester.request_path(start, goal, on_complete)
    }

    pub fn requester(&self) -> PathRequester {
        self.requester.clone()
    }

    pub fn pending_requests(&self) -> usize {
        self.requester.pending_requests()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Deliver the responses that are ready right now, in arrival order.
    ///
    /// Responses that arrive while handlers are running wait for the next
    /// call. Returns how many handlers were invoked.
    pub fn drain_completed_requests(&self) -> usize {
        let ready = self.results.len();
        let mut delivered = 0;

        for _ in 0..ready {
            let Ok(PathResponse { result, on_complete }) = self.results.try_recv() else {
                break;
            };
            self.requester.pending.fetch_sub(1, Ordering::SeqCst);
            on_complete(&result.waypoints, result.success);
            delivered += 1;
        }

        delivered
    }
}

impl Drop for PathDispatcher {
    fn drop(&mut self) {
        // Disconnecting the shutdown channel wakes every idle worker.
        self.shutdown.take();

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("A path worker terminated abnormally during shutdown");
            }
        }
        debug!("Path dispatcher stopped");
    }
}

fn worker_loop(
    index: usize,
    planner: Arc<dyn PathPlanner>,
    jobs: Receiver<PathRequest>,
    results: Sender<PathResponse>,
    shutdown: Receiver<()>,
) {
    loop {
        let request = select! {
            recv(shutdown) -> _ => break,
            recv(jobs) -> job => match job {
                Ok(job) => job,
                Err(_) => break,
            },
        };

        // select! picks fairly among ready channels; shutdown must win.
        if matches!(shutdown.try_recv(), Err(TryRecvError::Disconnected)) {
            break;
        }

        let PathRequest { start, goal, on_complete } = request;
        let result = match panic::catch_unwind(AssertUnwindSafe(|| planner.plan(start, goal))) {
            Ok(result) => result,
            Err(payload) => {
                warn!(
                    "Path worker {} failed planning {:?} -> {:?}: {}",
                    index,
                    start,
                    goal,
                    panic_message(payload.as_ref())
                );
                SearchResult::failure()
            }
        };

        if results.send(PathResponse { result, on_complete }).is_err() {
            break;
        }
    }

    debug!("Path worker {} exiting", index);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
