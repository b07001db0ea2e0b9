pub mod backend;
pub mod map;
pub mod serve;
pub mod sync;
