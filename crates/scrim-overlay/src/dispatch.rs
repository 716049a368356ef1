//! UI-thread marshalling with panic isolation.
//!
//! All toolkit objects are owned by a single UI thread. Engine worker
//! threads never touch them directly; they post closures here and the UI
//! thread runs them in submission order.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, error, info};

/// A unit of work marshalled onto the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

enum UiCommand {
    Run(UiTask),
    Shutdown,
}

/// Cloneable handle used to post work onto the UI thread.
#[derive(Clone)]
pub struct UiDispatcher {
    tx: Sender<UiCommand>,
    ui_thread: ThreadId,
}

impl UiDispatcher {
    /// Post a task to the UI thread's queue.
    ///
    /// Tasks run in submission order and are never reordered. If the UI
    /// loop is no longer alive the post is a silent no-op: the process is
    /// shutting down and there is nothing left to mutate.
    pub fn post<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.tx.send(UiCommand::Run(Box::new(task))).is_err() {
            debug!("UI loop gone, dropping posted task");
        }
    }

    /// Run a task on the UI thread: inline when already there, otherwise
    /// posted to the queue.
    pub fn run_on_ui<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_ui_thread() {
            task();
        } else {
            self.post(task);
        }
    }

    /// Whether the calling thread is the UI thread.
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }
}

/// Owns the UI thread and its work loop.
pub struct UiThread {
    dispatcher: UiDispatcher,
    tx: Sender<UiCommand>,
    handle: Option<JoinHandle<()>>,
}

impl UiThread {
    /// Spawn the UI thread and start its work loop.
    pub fn spawn() -> Self {
        let (tx, rx) = unbounded();
        let handle = thread::Builder::new()
            .name("scrim-ui".to_string())
            .spawn(move || {
                info!("UI thread started");
                run_ui_loop(rx);
                info!("UI thread stopped");
            })
            .expect("Failed to spawn UI thread");

        let dispatcher = UiDispatcher {
            tx: tx.clone(),
            ui_thread: handle.thread().id(),
        };

        Self {
            dispatcher,
            tx,
            handle: Some(handle),
        }
    }

    pub fn dispatcher(&self) -> UiDispatcher {
        self.dispatcher.clone()
    }

    /// Drain all pending work, then stop the loop and join the thread.
    pub fn join(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // The shutdown sentinel queues behind previously posted tasks, so
        // everything already submitted still runs.
        let _ = self.tx.send(UiCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_ui_loop(rx: Receiver<UiCommand>) {
    loop {
        let task = match rx.recv() {
            Ok(UiCommand::Run(task)) => task,
            Ok(UiCommand::Shutdown) | Err(_) => break,
        };

        // A panicking task must not take the whole UI loop down with it.
        if let Err(panic_info) = panic::catch_unwind(AssertUnwindSafe(task)) {
            let message = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("UI task panicked: {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn fence(dispatcher: &UiDispatcher) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        dispatcher.post(move || {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_tasks_run_in_submission_order() {
        let ui = UiThread::spawn();
        let dispatcher = ui.dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..16 {
            let seen = seen.clone();
            dispatcher.post(move || seen.lock().unwrap().push(i));
        }
        fence(&dispatcher);

        assert_eq!(*seen.lock().unwrap(), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_run_on_ui_is_inline_on_the_ui_thread() {
        let ui = UiThread::spawn();
        let dispatcher = ui.dispatcher();
        let (tx, rx) = crossbeam_channel::bounded(1);

        let inner = dispatcher.clone();
        dispatcher.post(move || {
            let ran = Arc::new(AtomicBool::new(false));
            let flag = ran.clone();
            inner.run_on_ui(move || flag.store(true, Ordering::SeqCst));
            // Inline execution: the flag is set before run_on_ui returns.
            let _ = tx.send(ran.load(Ordering::SeqCst));
        });

        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_posts_after_shutdown_are_dropped() {
        let ui = UiThread::spawn();
        let dispatcher = ui.dispatcher();
        ui.join();

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        dispatcher.post(move || flag.store(true, Ordering::SeqCst));

        thread::sleep(Duration::from_millis(50));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_loop_survives_a_panicking_task() {
        let ui = UiThread::spawn();
        let dispatcher = ui.dispatcher();

        dispatcher.post(|| panic!("boom"));

        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        dispatcher.post(move || flag.store(true, Ordering::SeqCst));
        fence(&dispatcher);

        assert!(ran.load(Ordering::SeqCst));
    }
}
