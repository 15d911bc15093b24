pub mod data;
pub mod dropout;
pub mod inference;
pub mod model;
pub mod scheduler;
pub mod training;

#[cfg(test)]
pub type TestBackend = burn::backend::NdArray<f32>;
#[cfg(test)]
pub type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;
