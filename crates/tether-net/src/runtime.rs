//! Runtime management for async operations.
//!
//! A transport runs its exchanges on the tokio runtime that is current when
//! it is built. Outside of any runtime it falls back to a global one, created
//! on first use.

use std::sync::OnceLock;

use tokio::runtime::{Handle, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Initialize the global runtime.
///
/// If not called explicitly, the runtime is created on first use.
pub fn init() -> &'static Runtime {
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tether-net")
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime")
    })
}

/// Get a reference to the global runtime.
///
/// Initializes the runtime if it hasn't been created yet.
pub fn get() -> &'static Runtime {
    init()
}

/// Block on a future using the global runtime.
///
/// # Warning
///
/// Do not call this from within an async context, as it will block the
/// current thread.
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    get().block_on(future)
}

/// Spawn a future on the global runtime.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    get().spawn(future)
}

/// The current runtime's handle, or the global runtime's.
pub fn handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| get().handle().clone())
}
