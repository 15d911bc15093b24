use burn::config::Config;
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, Tensor};

/// Configuration to create a [SpatialDropout] layer using the
/// [init function](SpatialDropoutConfig::init).
#[derive(Config, Debug)]
pub struct SpatialDropoutConfig {
    /// The probability of dropping an entire feature-map channel during training.
    pub prob: f64,
}

/// Zeroes whole feature-map channels at random during training.
///
/// Unlike per-element [Dropout](burn::nn::Dropout), a single keep/drop decision
/// is made per `[batch, channel]` pair and broadcast across every spatial
/// position, so a dropped channel vanishes entirely. Kept channels are scaled
/// by `1 / (1 - prob)` so activations keep the same expected magnitude.
#[derive(Module, Clone, Debug)]
pub struct SpatialDropout {
    /// The probability of dropping a channel.
    pub prob: f64,
}

impl SpatialDropoutConfig {
    /// Initialize a new [SpatialDropout] layer.
    pub fn init(&self) -> SpatialDropout {
        SpatialDropout { prob: self.prob }
    }
}

impl SpatialDropout {
    /// Applies the forward pass on the input tensor.
    ///
    /// # Shapes
    ///
    /// - input: `[batch_size, channels, height, width]`
    /// - output: `[batch_size, channels, height, width]`
    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        if !B::ad_enabled() || self.prob == 0.0 {
            return input;
        }

        let prob_keep = 1.0 - self.prob;
        if prob_keep <= 0.0 {
            return input.zeros_like();
        }

        let [batch_size, channels, _, _] = input.dims();
        let mask = Tensor::<B, 4>::random(
            [batch_size, channels, 1, 1],
            Distribution::Bernoulli(prob_keep),
            &input.device(),
        );

        let x = input * mask;
        x * (1.0 / prob_keep)
    }
}
