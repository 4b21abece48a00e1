pub mod camera;
pub mod draw;
pub mod geometry;
pub mod lava;
pub mod platforms;
pub mod player;
pub mod records;
