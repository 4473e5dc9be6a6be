//! Detached task spawning for narration jobs and unlock work.

use std::future::Future;

/// Run `future` to completion in the background.
///
/// Uses the ambient tokio runtime when there is one; otherwise the future is
/// driven on a dedicated thread.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => {
            tracing::debug!("No tokio runtime on this thread, driving task on a helper thread");
            std::thread::spawn(move || futures::executor::block_on(future));
        }
    }
}

/// Run `future` on the browser event loop.
#[cfg(target_arch = "wasm32")]
pub(crate) fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}
