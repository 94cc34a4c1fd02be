pub mod bilateral;

pub use bilateral::bilateral_denoise;
