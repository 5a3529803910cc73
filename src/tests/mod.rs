pub mod test_env;
pub mod test_hindsight;
pub mod test_optimizer;
pub mod test_trainer;
