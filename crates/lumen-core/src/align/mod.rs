pub mod block_match;
mod dispatcher;
pub mod pyramid;
pub mod warp;

pub use dispatcher::{align_frames_with_progress, AlignedBurst};
pub use pyramid::ImagePyramid;
pub use warp::warp_translate;
