use burn::config::Config;
use burn::lr_scheduler::LrScheduler;
use burn::tensor::backend::Backend;
use burn::LearningRate;

/// Configuration to create a [DecayLrScheduler].
///
/// The learning rate at step `t` is `floor_lr + base_lr * exp(-t / decay_steps)`:
/// exponential decay from `floor_lr + base_lr` toward `floor_lr`, halving
/// roughly every `decay_steps * ln 2` steps.
#[derive(Config, Debug)]
pub struct DecayLrSchedulerConfig {
    /// The decaying part of the learning rate at step 0.
    pub base_lr: LearningRate,
    /// The rate the schedule approaches as the step count grows.
    #[config(default = 1e-4)]
    pub floor_lr: LearningRate,
    /// The number of steps after which the decaying part has shrunk to 1/e.
    #[config(default = 2000.0)]
    pub decay_steps: f64,
}

impl DecayLrSchedulerConfig {
    /// Initializes a [DecayLrScheduler].
    ///
    /// # Errors
    ///
    /// An error will be returned if `base_lr` is not strictly positive or
    /// `decay_steps` is not strictly positive.
    pub fn init(&self) -> Result<DecayLrScheduler, String> {
        if self.base_lr <= 0.0 {
            return Err("Base learning rate must be greater than 0".into());
        }
        if self.floor_lr < 0.0 {
            return Err("Floor learning rate must not be negative".into());
        }
        if self.decay_steps <= 0.0 {
            return Err("Decay steps must be greater than 0".into());
        }

        Ok(DecayLrScheduler {
            base_lr: self.base_lr,
            floor_lr: self.floor_lr,
            decay_steps: self.decay_steps,
            step_count: 0,
        })
    }
}

/// Exponentially decaying learning rate scheduler with a floor.
///
/// See [DecayLrSchedulerConfig] for more information.
#[derive(Clone, Copy, Debug)]
pub struct DecayLrScheduler {
    base_lr: LearningRate,
    floor_lr: LearningRate,
    decay_steps: f64,
    step_count: usize,
}

impl LrScheduler for DecayLrScheduler {
    type Record<B: Backend> = usize;

    fn step(&mut self) -> LearningRate {
        // Derived from the step counter every call, never cached.
        let decay = (-(self.step_count as f64) / self.decay_steps).exp();
        self.step_count += 1;
        self.floor_lr + self.base_lr * decay
    }

    fn to_record<B: Backend>(&self) -> Self::Record<B> {
        self.step_count
    }

    fn load_record<B: Backend>(mut self, record: Self::Record<B>) -> Self {
        self.step_count = record;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;

    #[test]
    fn config_rejects_non_positive_base_lr() {
        assert!(DecayLrSchedulerConfig::new(0.0).init().is_err());
        assert!(DecayLrSchedulerConfig::new(-0.003).init().is_err());
    }

    #[test]
    fn config_rejects_non_positive_decay_steps() {
        let config = DecayLrSchedulerConfig::new(0.003).with_decay_steps(0.0);
        assert!(config.init().is_err());
    }

    #[test]
    fn first_step_is_floor_plus_base() {
        let mut scheduler = DecayLrSchedulerConfig::new(0.003).init().unwrap();
        let lr = scheduler.step();
        assert!((lr - 0.0031).abs() < 1e-12);
    }

    #[test]
    fn schedule_decreases_strictly_toward_the_floor() {
        let mut scheduler = DecayLrSchedulerConfig::new(0.003).init().unwrap();

        let mut previous = f64::INFINITY;
        for _ in 0..10_000 {
            let lr = scheduler.step();
            assert!(lr < previous, "learning rate must be strictly decreasing");
            assert!(lr > 1e-4, "learning rate must stay above the floor");
            previous = lr;
        }

        // After 10k steps the decaying part is e^-5 of the base rate.
        assert!(previous - 1e-4 < 0.003 * (-4.9f64).exp());
    }

    #[test]
    fn record_round_trip_resumes_the_sequence() {
        let mut scheduler = DecayLrSchedulerConfig::new(0.003).init().unwrap();
        let mut truth = scheduler;

        for _ in 0..250 {
            truth.step();
            scheduler.step();
        }

        let record = scheduler.to_record::<TestBackend>();
        let mut restored = DecayLrSchedulerConfig::new(0.003)
            .init()
            .unwrap()
            .load_record::<TestBackend>(record);

        for _ in 0..250 {
            assert_eq!(truth.step(), restored.step());
        }
    }
}
