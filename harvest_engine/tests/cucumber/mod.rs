mod harvest_world;
mod setups;
mod steps;

pub use harvest_world::HarvestWorld;
