pub mod bag;
pub mod error;
pub mod key;
pub mod rng;
pub mod sampler;
pub mod validator;

pub use bag::{build_bag, Bag};
pub use error::BagError;
pub use key::{generate_key, generate_picks};
pub use rng::RandomSource;
