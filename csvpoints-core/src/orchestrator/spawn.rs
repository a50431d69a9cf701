//! Scheduling of background runs.

use std::io;
use std::thread;

/// Unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Starts background work for asynchronous runs.
///
/// A failed spawn makes the orchestrator fall back to attribute-only
/// features.
pub trait Spawner: Send + Sync {
    /// Schedule `task` to run independently of the caller.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] when the task cannot be scheduled.
    fn spawn(&self, task: Task) -> io::Result<()>;
}

/// Runs each task on a freshly named OS thread.
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    name: String,
}

impl Default for ThreadSpawner {
    fn default() -> Self {
        Self {
            name: "csvpoints-geocode".to_owned(),
        }
    }
}

impl ThreadSpawner {
    /// Spawner naming its threads `name`.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Spawner for ThreadSpawner {
    fn spawn(&self, task: Task) -> io::Result<()> {
        thread::Builder::new()
            .name(self.name.clone())
            .spawn(task)
            .map(drop)
    }
}
