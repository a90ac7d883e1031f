pub mod alignment;
pub mod analysis;
pub mod blast;
pub mod config;
pub mod errors;
pub mod export;
pub mod mutations;
pub mod pepstats;
pub mod seq;
pub mod seqprop;
mod runner;

use crate::errors::SeqPropError;

pub fn run() -> Result<(), SeqPropError> {
    runner::run()
}
