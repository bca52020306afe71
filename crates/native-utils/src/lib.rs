pub mod audio;
pub mod device;
pub mod player;
pub mod recorder;
