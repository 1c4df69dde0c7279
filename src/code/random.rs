use super::{CodeGenerator, CodeRecord};
use anyhow::{ensure, Result};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::{
    num::NonZeroUsize,
    sync::{Arc, PoisonError, RwLock, Weak},
    time::{Duration, SystemTime},
};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Code generator backed by the operating system CSPRNG.
///
/// A background task replaces the code every `interval`. The task only keeps a
/// weak reference, so it stops once the last `Arc` to the generator is dropped.
#[derive(Debug)]
pub struct RandomCodeGenerator {
    length: NonZeroUsize,
    interval: Duration,
    current: RwLock<CodeRecord>,
}

impl RandomCodeGenerator {
    /// Create the generator with its first code already in place and start rotating.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if `interval` is zero.
    pub fn new(length: NonZeroUsize, interval: Duration) -> Result<Arc<Self>> {
        ensure!(!interval.is_zero(), "code interval must be greater than zero");

        let generator = Arc::new(Self {
            length,
            interval,
            current: RwLock::new(fresh_record(length, interval)),
        });

        spawn_rotation(Arc::downgrade(&generator), interval);

        Ok(generator)
    }

    #[must_use]
    pub fn length(&self) -> NonZeroUsize {
        self.length
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn rotate(&self) {
        // Draw the new code before taking the lock; the write itself is a swap.
        let record = fresh_record(self.length, self.interval);
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = record;
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> CodeRecord {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn spawn_rotation(generator: Weak<RandomCodeGenerator>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(generator) = generator.upgrade() else {
                debug!("code generator dropped, stopping rotation");
                return;
            };

            generator.rotate();

            debug!("code rotated, next rotation in {}s", period.as_secs());
        }
    });
}

fn fresh_record(length: NonZeroUsize, interval: Duration) -> CodeRecord {
    CodeRecord {
        value: random_code(length),
        expires_at: SystemTime::now() + interval,
    }
}

/// Draw `length` characters uniformly from `[A-Za-z0-9]`.
fn random_code(length: NonZeroUsize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(length.get())
        .map(char::from)
        .collect()
}
