//! Driving gateway futures without a tokio runtime.
//!
//! Background tasks cannot be spawned outside a runtime, which makes the
//! authority's start fail. Useful for exercising the startup unwind path
//! with the mock collaborators, whose futures complete on first poll.

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};

/// Upper bound on polls before giving up.
const MAX_POLLS: usize = 1_000;

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

/// Poll `future` to completion on the current thread, outside any runtime.
///
/// # Panics
///
/// Panics if the future is still pending after [`MAX_POLLS`] polls, i.e. it
/// waits on I/O or timers.
pub fn block_on_without_runtime<F: Future>(future: F) -> F::Output {
    let waker = Waker::from(Arc::new(NoopWake));
    let mut cx = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    for _ in 0..MAX_POLLS {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
    }
    panic!("future still pending after {MAX_POLLS} polls; it needs a runtime");
}
