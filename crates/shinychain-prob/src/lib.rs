pub mod comparison;
pub mod distribution;
pub mod export;
pub mod hypothesis;
pub mod model;
pub mod permutation;
pub mod sampler;

pub use comparison::{kolmogorov_two_sample, rmse, KsOutcome};
pub use distribution::{
    align, bin, build_raw_distribution, cumulative, normalize, BinSpec, Distribution,
};
pub use hypothesis::{
    run_ks_test, run_rmse_test, HypothesisConfig, KsReport, ObservedData, RmseReport,
};
pub use model::ProbabilityModel;
pub use permutation::{count_worse_than_observed, PermutationConfig};
pub use sampler::{sample_chain_length, seeded_stream};
