use crate::events::GameEvent;
use crate::grid::GridPos;
use crate::tile::PlayerId;
use crate::world::World;

/// Claims unclaimed land around `center` for `owner`.
///
/// The center is claimed whatever its terrain; ring tiles out to `radius`
/// are claimed only if they are land. Tiles that already belong to anyone
/// are left alone, so repeated captures change nothing. Returns the newly
/// claimed positions, center first.
pub(crate) fn capture_around(
    world: &mut World,
    center: GridPos,
    owner: PlayerId,
    radius: u32,
) -> Vec<GridPos> {
    let mut claimed = Vec::new();
    if world.tile(center).is_some_and(|tile| !tile.is_claimed()) {
        claimed.push(center);
    }
    claimed.extend(center.ring_area(radius).filter(|pos| {
        world
            .tile(*pos)
            .is_some_and(|tile| !tile.is_claimed() && !tile.is_water())
    }));

    for pos in &claimed {
        world.set_owner(*pos, owner);
    }
    if !claimed.is_empty() {
        tracing::debug!(%owner, %center, tiles = claimed.len(), "territory captured");
        world.emit(GameEvent::TerritoryCaptured {
            owner,
            center,
            tiles: claimed.clone(),
        });
    }
    claimed
}
