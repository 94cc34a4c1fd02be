pub mod weighted;

pub use weighted::weighted_merge;
