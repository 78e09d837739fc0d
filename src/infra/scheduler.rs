use {
    std::{future::Future, pin::Pin, time::Duration},
};

pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs a task once after a delay. The deferred saved-payment check is the
/// only core consumer.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task);
}

pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
    }
}
