use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::activations::Activation;
use crate::error::{Result, SubgoalError};
use crate::layers::{DenseLayer, WeightInit};
use crate::loss::Loss;
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward neural network consisting of dense layers and an optimizer.
///
/// Two entry points exist for the forward pass: `forward_batch` caches the
/// intermediate values needed by backpropagation, `predict`/`predict_batch`
/// leave the network untouched and are used wherever no gradient is needed.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes, activations, and optimizer.
    /// `layer_sizes` includes the input size, so it holds one more entry than `activations`.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(SubgoalError::invalid_parameter(
                "layer_sizes",
                "network must have at least input and output layers",
            ));
        }
        if layer_sizes.len() - 1 != activations.len() {
            return Err(SubgoalError::dimension_mismatch(
                format!("{} activations", layer_sizes.len() - 1),
                format!("{} activations", activations.len()),
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(SubgoalError::invalid_parameter(
                "layer_sizes",
                "every layer must have at least one unit",
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| {
                DenseLayer::new(window[0], window[1], activation, WeightInit::for_activation(activation), rng)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(NeuralNetwork { layers, optimizer })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_size())
    }

    /// Inference for a single input vector.
    pub fn predict(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let output = self.predict_batch(input.insert_axis(Axis(0)))?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Inference for a batch of input vectors, one per row.
    pub fn predict_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(inputs)?;
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            current_output = layer.predict_batch(current_output.view());
        }
        Ok(current_output)
    }

    /// Forward pass for a batch, caching what `backward_batch` needs.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(inputs)?;
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        Ok(current_output)
    }

    /// Backpropagate `output_errors` (the loss gradient at the outputs) and return
    /// the `(weight, bias)` gradients of every layer, first layer first.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients: Vec<(Array2<f32>, Array1<f32>)> = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push((weight_gradients, bias_gradients));

            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One optimizer step on `loss(forward(inputs), targets)`.
    /// Returns the loss measured before the update.
    pub fn train_minibatch(
        &mut self,
        inputs: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        loss: &dyn Loss,
        learning_rate: f32,
    ) -> Result<f32> {
        let outputs = self.forward_batch(inputs)?;
        if outputs.dim() != targets.dim() {
            return Err(SubgoalError::dimension_mismatch(
                format!("{:?}", outputs.dim()),
                format!("{:?}", targets.dim()),
            ));
        }

        let value = loss.compute_batch(outputs.view(), targets);
        if !value.is_finite() {
            return Err(SubgoalError::Numerical(format!("non-finite loss {}", value)));
        }

        let output_errors = loss.gradient_batch(outputs.view(), targets);
        let gradients = self.backward_batch(output_errors.view())?;

        self.optimizer.begin_step();
        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
        }

        Ok(value)
    }

    /// Overwrite this network's weights and biases with a copy of `source`'s.
    /// Optimizer state is left alone.
    pub fn copy_parameters_from(&mut self, source: &NeuralNetwork) -> Result<()> {
        if self.layers.len() != source.layers.len() {
            return Err(SubgoalError::dimension_mismatch(
                format!("{} layers", source.layers.len()),
                format!("{} layers", self.layers.len()),
            ));
        }
        for (target, source) in self.layers.iter_mut().zip(&source.layers) {
            if target.weights.dim() != source.weights.dim() {
                return Err(SubgoalError::dimension_mismatch(
                    format!("{:?}", source.weights.dim()),
                    format!("{:?}", target.weights.dim()),
                ));
            }
            target.weights.assign(&source.weights);
            target.biases.assign(&source.biases);
            target.activation = source.activation;
        }
        Ok(())
    }

    /// Save the neural network's state to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load a neural network from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buffer = fs::read(path)?;
        let deserialized: Self = bincode::deserialize(&buffer)?;
        Ok(deserialized)
    }

    fn check_input(&self, inputs: ArrayView2<f32>) -> Result<()> {
        if inputs.ncols() != self.input_size() {
            return Err(SubgoalError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{} input features", inputs.ncols()),
            ));
        }
        Ok(())
    }
}
