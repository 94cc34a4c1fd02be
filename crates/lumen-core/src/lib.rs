pub mod align;
pub mod compute;
pub mod consts;
pub mod error;
pub mod filters;
pub mod frame;
pub mod ghost;
pub mod pipeline;
pub mod resources;
pub mod stack;
