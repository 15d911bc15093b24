use crate::data::{MnistBatch, MnistBatcher};
use crate::model::Model;
use crate::training::TrainingConfig;
use burn::{
    data::{dataloader::batcher::Batcher, dataset::vision::MnistItem},
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::activation::softmax,
};

/// Reloads the trained model from `artifact_dir` and classifies a single item,
/// printing the predicted class next to the ground truth.
pub fn infer<B: Backend>(artifact_dir: &str, device: B::Device, item: MnistItem) {
    let config = TrainingConfig::load(format!("{artifact_dir}/config.json"))
        .expect("Config should exist for the model; run train first");
    let record = CompactRecorder::new()
        .load(format!("{artifact_dir}/model").into(), &device)
        .expect("Trained model should exist; run train first");

    let model: Model<B> = config.model.init(&device).load_record(record);

    let label = item.label;
    let batcher = MnistBatcher::default();
    let batch: MnistBatch<B> = batcher.batch(vec![item], &device);

    let probabilities = softmax(model.forward(batch.images), 1);
    let predicted = probabilities.argmax(1).flatten::<1>(0, 1).into_scalar();

    println!("Predicted {predicted} Expected {label}");
}
