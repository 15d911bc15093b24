use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataset::{vision::MnistDataset, Dataset},
    optim::AdamConfig,
};
use mnist_cnn::{
    inference,
    model::ModelConfig,
    scheduler::DecayLrSchedulerConfig,
    training::{self, TrainingConfig},
};

const ARTIFACT_DIR: &str = "/tmp/mnist-cnn";

fn main() {
    type MyBackend = NdArray<f32>;
    type MyAutodiffBackend = Autodiff<MyBackend>;

    let device = NdArrayDevice::Cpu;
    let config = TrainingConfig::new(
        ModelConfig::new(),
        // Epsilon matching tf.train.AdamOptimizer.
        AdamConfig::new().with_epsilon(1e-8),
        DecayLrSchedulerConfig::new(0.003),
    );

    training::train::<MyAutodiffBackend>(ARTIFACT_DIR, config, device);

    inference::infer::<MyBackend>(
        ARTIFACT_DIR,
        device,
        MnistDataset::test()
            .get(42)
            .expect("Test dataset should contain the sample item"),
    );
}
