use cucumber::given;

use crate::cucumber::{harvest_world::HarvestSystem, HarvestWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut HarvestWorld) {
    let system = HarvestSystem::new().await;
    world.system = Some(system);
}
