mod candb_world;
mod setups;
mod steps;

pub use candb_world::CanDbWorld;
