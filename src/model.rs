use crate::data::MnistBatch;
use crate::dropout::{SpatialDropout, SpatialDropoutConfig};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        loss::CrossEntropyLossConfig,
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Initializer, LeakyRelu,
        LeakyReluConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
    train::{ClassificationOutput, TrainOutput, TrainStep, ValidStep},
};

/// Standard deviation shared by every weight tensor at initialization.
const WEIGHT_STD: f64 = 0.1;

/// Initial value of the fully connected biases, small and positive so the
/// ReLU units start out active.
const BIAS_INIT: f64 = 0.1;

#[derive(Config, Debug)]
pub struct ModelConfig {
    #[config(default = 10)]
    pub num_classes: usize,
    /// Output channels of the three convolutional blocks.
    #[config(default = 24)]
    pub conv1_channels: usize,
    #[config(default = 48)]
    pub conv2_channels: usize,
    #[config(default = 64)]
    pub conv3_channels: usize,
    /// Width of the fully connected hidden layer.
    #[config(default = 200)]
    pub hidden_size: usize,
    /// Probability of keeping a unit during dropout.
    #[config(default = 0.75)]
    pub keep_prob: f64,
}

/// Convolutional MNIST classifier.
///
/// Three convolutional blocks (28x28 -> 14x14 -> 7x7) followed by one hidden
/// fully connected layer, every layer batch-normalized. The convolutions carry
/// no bias since batch normalization supplies the shift.
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,
    fc1: Linear<B>,
    norm: BatchNorm<B, 0>,
    activation: Relu,
    dropout: Dropout,
    fc2: Linear<B>,
}

/// Convolution with "same" padding, batch norm, leaky ReLU and per-channel
/// dropout.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    activation: LeakyRelu,
    dropout: SpatialDropout,
}

/// Padding for one spatial dimension so the output size is
/// `ceil(size / stride)`, with any odd amount going to the trailing edge.
fn same_padding(size: usize, kernel_size: usize, stride: usize) -> (usize, usize) {
    let size_out = size.div_ceil(stride);
    let needed = ((size_out - 1) * stride + kernel_size).saturating_sub(size);
    (needed / 2, needed - needed / 2)
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(
        channels: [usize; 2],
        kernel_size: [usize; 2],
        stride: [usize; 2],
        drop_prob: f64,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new(channels, kernel_size)
            .with_stride(stride)
            .with_padding(PaddingConfig2d::Valid)
            .with_bias(false)
            .with_initializer(Initializer::Normal {
                mean: 0.0,
                std: WEIGHT_STD,
            })
            .init(device);
        let norm = BatchNormConfig::new(channels[1]).init(device);

        Self {
            conv,
            norm,
            // The slope tf.nn.leaky_relu applies below zero.
            activation: LeakyReluConfig::new().with_negative_slope(0.2).init(),
            dropout: SpatialDropoutConfig::new(drop_prob).init(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let [_, _, height, width] = input.dims();
        let (top, bottom) = same_padding(height, self.conv.kernel_size[0], self.conv.stride[0]);
        let (left, right) = same_padding(width, self.conv.kernel_size[1], self.conv.stride[1]);

        let x = input.pad((left, right, top, bottom), 0.0.elem::<B::FloatElem>());
        let x = self.conv.forward(x);
        let x = self.norm.forward(x);
        let x = self.activation.forward(x);
        self.dropout.forward(x)
    }
}

impl ModelConfig {
    /// Returns the initialized model.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        let drop_prob = 1.0 - self.keep_prob;
        let initializer = Initializer::Normal {
            mean: 0.0,
            std: WEIGHT_STD,
        };

        // 28x28 input, two stride-2 blocks: the last feature map is 7x7.
        let fc_input = 7 * 7 * self.conv3_channels;
        let mut fc1 = LinearConfig::new(fc_input, self.hidden_size)
            .with_initializer(initializer.clone())
            .init(device);
        fc1.bias = Some(Initializer::Constant { value: BIAS_INIT }.init([self.hidden_size], device));
        let mut fc2 = LinearConfig::new(self.hidden_size, self.num_classes)
            .with_initializer(initializer)
            .init(device);
        fc2.bias = Some(Initializer::Constant { value: BIAS_INIT }.init([self.num_classes], device));

        Model {
            conv1: ConvBlock::new([1, self.conv1_channels], [6, 6], [1, 1], drop_prob, device),
            conv2: ConvBlock::new(
                [self.conv1_channels, self.conv2_channels],
                [5, 5],
                [2, 2],
                drop_prob,
                device,
            ),
            conv3: ConvBlock::new(
                [self.conv2_channels, self.conv3_channels],
                [4, 4],
                [2, 2],
                drop_prob,
                device,
            ),
            fc1,
            norm: BatchNormConfig::new(self.hidden_size).init(device),
            activation: Relu::new(),
            dropout: DropoutConfig::new(drop_prob).init(),
            fc2,
        }
    }
}

impl<B: Backend> Model<B> {
    /// Forward pass producing one logit per class.
    ///
    /// # Shapes
    ///
    /// - images: `[batch_size, 1, 28, 28]`
    /// - output: `[batch_size, num_classes]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(images); // [batch, 24, 28, 28]
        let x = self.conv2.forward(x); // [batch, 48, 14, 14]
        let x = self.conv3.forward(x); // [batch, 64, 7, 7]

        let x = x.flatten::<2>(1, 3);
        let x = self.fc1.forward(x);
        let x = self.norm.forward(x);
        let x = self.activation.forward(x);
        let x = self.dropout.forward(x);

        self.fc2.forward(x)
    }

    pub fn forward_classification(
        &self,
        images: Tensor<B, 4>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let output = self.forward(images);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());
        // The tutorial reports the per-image mean cross-entropy scaled by 100.
        let loss = loss * 100;

        ClassificationOutput::new(loss, output, targets)
    }
}

impl<B: AutodiffBackend> TrainStep<MnistBatch<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, batch: MnistBatch<B>) -> TrainOutput<ClassificationOutput<B>> {
        let item = self.forward_classification(batch.images, batch.targets);

        TrainOutput::new(self, item.loss.backward(), item)
    }
}

impl<B: Backend> ValidStep<MnistBatch<B>, ClassificationOutput<B>> for Model<B> {
    fn step(&self, batch: MnistBatch<B>) -> ClassificationOutput<B> {
        self.forward_classification(batch.images, batch.targets)
    }
}
