use std::{
    future::Future,
    ops::{Deref, DerefMut},
    pin::Pin,
    task::{Context, Poll},
};

use chrono::{DateTime, Local, Utc};
use tokio::task::{JoinError, JoinHandle};

/// A type that can not be instantiated
pub(crate) enum Never {}

pub(crate) trait DateTimeExt {
    fn format_local_millis(&self) -> String;
}

impl DateTimeExt for DateTime<Utc> {
    fn format_local_millis(&self) -> String {
        let local_time = self.with_timezone(&Local);
        local_time.format("%Y-%m-%d %H:%M:%S.%3f (%Z)").to_string()
    }
}

/// Owns a spawned task and aborts it when dropped.
///
/// Derefs to the inner [`JoinHandle`] and can be awaited in its place. Aborting does not run the
/// task's remaining code, so tasks wrapped in it must tolerate cancellation at any await point.
#[derive(Debug)]
pub(crate) struct AbortOnDropHandle<T>(JoinHandle<T>);

impl<T> From<JoinHandle<T>> for AbortOnDropHandle<T> {
    fn from(handle: JoinHandle<T>) -> Self {
        Self(handle)
    }
}

impl<T> Deref for AbortOnDropHandle<T> {
    type Target = JoinHandle<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for AbortOnDropHandle<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> Future for AbortOnDropHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<T> Drop for AbortOnDropHandle<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use chrono::TimeZone;
    use tokio::time;

    use super::*;

    #[test]
    fn format_local_millis_keeps_milliseconds() {
        let time = Utc.timestamp_millis_opt(1_760_000_000_123).unwrap();
        let formatted = time.format_local_millis();

        assert!(formatted.contains(".123 ("));
        assert!(formatted.ends_with(')'));
    }

    #[tokio::test]
    async fn abort_on_drop_handle_can_be_awaited() {
        let handle = AbortOnDropHandle::from(tokio::spawn(async { 42 }));

        assert_eq!(handle.await.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_on_drop_handle_aborts_task() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let handle = AbortOnDropHandle::from(tokio::spawn(async move {
            time::sleep(StdDuration::from_secs(60)).await;
            let _ = tx.send(());
        }));
        drop(handle);

        // The sender is dropped along with the aborted task.
        assert!(rx.await.is_err());
    }
}
