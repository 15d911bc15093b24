use crate::data::MnistBatcher;
use crate::model::ModelConfig;
use crate::scheduler::DecayLrSchedulerConfig;
use burn::{
    config::Config,
    data::{dataloader::DataLoaderBuilder, dataset::vision::MnistDataset},
    module::Module,
    optim::AdamConfig,
    record::CompactRecorder,
    tensor::backend::AutodiffBackend,
    train::{
        metric::{AccuracyMetric, LearningRateMetric, LossMetric},
        LearnerBuilder,
    },
};

#[derive(Config)]
pub struct TrainingConfig {
    pub model: ModelConfig,
    pub optimizer: AdamConfig,
    pub scheduler: DecayLrSchedulerConfig,
    /// The original step budget of 20 dataset passes, expressed in epochs.
    #[config(default = 20)]
    pub num_epochs: usize,
    #[config(default = 100)]
    pub batch_size: usize,
    /// Dataloader workers; keeps two batches in flight ahead of the trainer.
    #[config(default = 2)]
    pub num_workers: usize,
    #[config(default = 42)]
    pub seed: u64,
}

fn create_artifact_dir(artifact_dir: &str) {
    // Remove existing artifacts before to get an accurate learner summary
    std::fs::remove_dir_all(artifact_dir).ok();
    std::fs::create_dir_all(artifact_dir).ok();
}

/// Runs the full training loop, alternating one evaluation pass over the test
/// set after every training epoch and checkpointing model, optimizer and
/// scheduler state along the way.
pub fn train<B: AutodiffBackend>(artifact_dir: &str, config: TrainingConfig, device: B::Device) {
    create_artifact_dir(artifact_dir);
    config
        .save(format!("{artifact_dir}/config.json"))
        .expect("Config should be saved successfully");

    B::seed(config.seed);

    log::info!(
        "training for {} epochs with batch size {}",
        config.num_epochs,
        config.batch_size
    );

    let batcher = MnistBatcher::default();

    let dataloader_train = DataLoaderBuilder::new(batcher.clone())
        .batch_size(config.batch_size)
        .shuffle(config.seed)
        .num_workers(config.num_workers)
        .build(MnistDataset::train());

    let dataloader_test = DataLoaderBuilder::new(batcher)
        .batch_size(config.batch_size)
        .num_workers(config.num_workers)
        .build(MnistDataset::test());

    let scheduler = config
        .scheduler
        .init()
        .expect("Learning rate schedule should be valid");

    let learner = LearnerBuilder::new(artifact_dir)
        .metric_train_numeric(AccuracyMetric::new())
        .metric_valid_numeric(AccuracyMetric::new())
        .metric_train_numeric(LossMetric::new())
        .metric_valid_numeric(LossMetric::new())
        .metric_train_numeric(LearningRateMetric::new())
        .with_file_checkpointer(CompactRecorder::new())
        .devices(vec![device.clone()])
        .num_epochs(config.num_epochs)
        .summary()
        .build(
            config.model.init::<B>(&device),
            config.optimizer.init(),
            scheduler,
        );

    let model_trained = learner.fit(dataloader_train, dataloader_test);

    model_trained
        .save_file(format!("{artifact_dir}/model"), &CompactRecorder::new())
        .expect("Trained model should be saved successfully");

    log::info!("training done, artifacts written to {artifact_dir}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestBackend;
    use burn::data::dataloader::Progress;
    use burn::prelude::*;
    use burn::train::metric::{AccuracyInput, Metric, MetricMetadata, Numeric};

    #[test]
    fn defaults_match_the_tutorial_hyperparameters() {
        let config = TrainingConfig::new(
            ModelConfig::new(),
            AdamConfig::new(),
            DecayLrSchedulerConfig::new(0.003),
        );

        assert_eq!(config.batch_size, 100);
        assert_eq!(config.num_epochs, 20);
        assert_eq!(config.model.keep_prob, 0.75);
    }

    #[test]
    fn accuracy_accumulates_across_evaluation_batches() {
        let device = Default::default();
        let mut metric = AccuracyMetric::<TestBackend>::new();
        let metadata = MetricMetadata {
            progress: Progress {
                items_processed: 0,
                items_total: 0,
            },
            epoch: 1,
            epoch_total: 1,
            iteration: 1,
            lr: None,
        };

        // 2 of 4 correct.
        let input = AccuracyInput::new(
            Tensor::from_data(
                [
                    [0.0, 1.0, 0.0],
                    [0.0, 1.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                ],
                &device,
            ),
            Tensor::from_data([1, 1, 1, 1], &device),
        );
        metric.update(&input, &metadata);

        // 4 of 4 correct.
        let input = AccuracyInput::new(
            Tensor::from_data(
                [
                    [0.0, 1.0, 0.0],
                    [0.0, 1.0, 0.0],
                    [0.0, 1.0, 0.0],
                    [0.0, 1.0, 0.0],
                ],
                &device,
            ),
            Tensor::from_data([1, 1, 1, 1], &device),
        );
        let entry = metric.update(&input, &metadata);

        // `value` reports the latest batch; the entry carries the running
        // figure alongside it, 6 of 8 correct overall.
        assert_eq!(metric.value(), 100.0);
        assert!(
            entry.formatted.contains("75.00"),
            "entry should report the 6-of-8 running accuracy: {}",
            entry.formatted
        );
        assert!(
            entry.formatted.contains("100.00"),
            "entry should report the latest batch accuracy: {}",
            entry.formatted
        );
    }
}
