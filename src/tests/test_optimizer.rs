use ndarray::array;
use crate::optimizer::{Optimizer, OptimizerWrapper, SGD, Adam};

#[test]
fn test_sgd_update_weights() {
    let mut sgd = SGD::new();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, 0.2], [0.3, 0.4]];

    sgd.update_weights(0, &mut weights, &gradients, 0.5);

    let expected = array![[0.95, 0.9], [0.85, 0.8]];
    for (w, e) in weights.iter().zip(expected.iter()) {
        assert!((w - e).abs() < 1e-6);
    }
}

#[test]
fn test_sgd_update_biases() {
    let mut sgd = SGD::new();
    let mut biases = array![1.0, 1.0];
    let gradients = array![0.5, -0.5];

    sgd.update_biases(0, &mut biases, &gradients, 0.1);

    assert!((biases[0] - 0.95).abs() < 1e-6);
    assert!((biases[1] - 1.05).abs() < 1e-6);
}

#[test]
fn test_adam_new() {
    let adam = Adam::new(0.9, 0.999, 1e-8);
    assert_eq!(adam.beta1, 0.9);
    assert_eq!(adam.beta2, 0.999);
    assert_eq!(adam.epsilon, 1e-8);
    assert_eq!(adam.t, 0);
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    // With bias correction the first Adam step is lr * sign(g) (up to epsilon)
    let mut adam = Adam::default();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.5, -0.5], [2.0, -0.01]];

    adam.begin_step();
    adam.update_weights(0, &mut weights, &gradients, 0.01);

    let expected = array![[0.99, 1.01], [0.99, 1.01]];
    for (w, e) in weights.iter().zip(expected.iter()) {
        assert!((w - e).abs() < 1e-4, "{} vs {}", w, e);
    }
    assert_eq!(adam.t, 1);
}

#[test]
fn test_adam_keeps_state_per_layer() {
    let mut adam = Adam::default();
    let mut first = array![[0.0, 0.0]];
    let mut second = array![[0.0], [0.0], [0.0]];
    let mut first_bias = array![0.0, 0.0];

    for _ in 0..3 {
        adam.begin_step();
        adam.update_weights(0, &mut first, &array![[1.0, 1.0]], 0.1);
        adam.update_weights(1, &mut second, &array![[-1.0], [-1.0], [-1.0]], 0.1);
        adam.update_biases(0, &mut first_bias, &array![1.0, -1.0], 0.1);
    }

    assert!(first.iter().all(|&w| w < 0.0));
    assert!(second.iter().all(|&w| w > 0.0));
    assert!(first_bias[0] < 0.0 && first_bias[1] > 0.0);
}

#[test]
fn test_wrapper_dispatch_and_serialization() {
    let mut wrapper = OptimizerWrapper::Adam(Adam::default());
    let mut weights = array![[1.0]];
    wrapper.begin_step();
    wrapper.update_weights(0, &mut weights, &array![[1.0]], 0.1);
    assert!(weights[[0, 0]] < 1.0);

    let bytes = bincode::serialize(&wrapper).unwrap();
    let restored: OptimizerWrapper = bincode::deserialize(&bytes).unwrap();
    match restored {
        OptimizerWrapper::Adam(adam) => assert_eq!(adam.t, 1),
        OptimizerWrapper::SGD(_) => panic!("expected Adam"),
    }
}
