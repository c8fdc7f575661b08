use pocketciv::{testing::GameBuilder, GridPos, PlayerId, Rejection, Terrain, UnitId};

const P1: PlayerId = PlayerId(1);

#[test]
fn reachable_covers_chebyshev_three() {
    let game = GameBuilder::new()
        .grid(11, 11, Terrain::Grass)
        .unit(1, (5, 5))
        .build()
        .unwrap();

    let reachable = game.reachable_tiles(UnitId(0));

    assert_eq!(reachable.len(), 48);
    assert!(!reachable.contains(&GridPos::new(5, 5)));
    assert!(reachable.iter().all(|pos| pos.chebyshev(GridPos::new(5, 5)) <= 3));
}

#[test]
fn reachable_skips_occupied_tile() {
    let game = GameBuilder::new()
        .grid(11, 11, Terrain::Grass)
        .unit(1, (5, 5))
        .unit(2, (6, 5))
        .build()
        .unwrap();

    let reachable = game.reachable_tiles(UnitId(0));

    assert_eq!(reachable.len(), 47);
    assert!(!reachable.contains(&GridPos::new(6, 5)));
}

#[test]
fn move_spends_distance_and_updates_tiles() {
    let mut game = GameBuilder::new()
        .grid(6, 6, Terrain::Grass)
        .unit(1, (0, 0))
        .build()
        .unwrap();

    let report = game.move_unit(P1, UnitId(0), GridPos::new(3, 2)).unwrap();

    assert_eq!((report.cost, report.moves_left), (3, 0));
    assert_eq!(game.tile(GridPos::new(0, 0)).unwrap().unit, None);
    assert_eq!(game.tile(GridPos::new(3, 2)).unwrap().unit, Some(UnitId(0)));
    assert_eq!(
        game.move_unit(P1, UnitId(0), GridPos::new(3, 3)),
        Err(Rejection::NoMovePoints)
    );
    assert!(game.reachable_tiles(UnitId(0)).is_empty());
}

#[test]
fn cannot_move_someone_elses_unit() {
    let mut game = GameBuilder::new()
        .grid(4, 4, Terrain::Grass)
        .unit(2, (0, 0))
        .build()
        .unwrap();

    assert_eq!(
        game.move_unit(P1, UnitId(0), GridPos::new(1, 1)),
        Err(Rejection::NotOwnedByCaller)
    );
    assert_eq!(
        game.move_unit(P1, UnitId(9), GridPos::new(1, 1)),
        Err(Rejection::UnknownUnit { unit: UnitId(9) })
    );
}

#[test]
fn water_blocks_moves_by_default() {
    let mut game = GameBuilder::new()
        .grid(3, 1, Terrain::Grass)
        .terrain((1, 0), Terrain::Water)
        .unit(1, (0, 0))
        .build()
        .unwrap();

    assert_eq!(
        game.move_unit(P1, UnitId(0), GridPos::new(1, 0)),
        Err(Rejection::InvalidTerrain)
    );
    // Straight-line pricing: the river in between does not matter.
    assert!(game.move_unit(P1, UnitId(0), GridPos::new(2, 0)).is_ok());
}

#[test]
fn busy_unit_is_locked() {
    let mut game = GameBuilder::new()
        .grid(4, 4, Terrain::Grass)
        .unit(1, (0, 0))
        .build()
        .unwrap();

    game.set_unit_busy(UnitId(0), true).unwrap();
    assert_eq!(
        game.move_unit(P1, UnitId(0), GridPos::new(1, 1)),
        Err(Rejection::UnitBusy)
    );
    assert_eq!(game.end_turn(P1), Err(Rejection::ActionInProgress));

    game.set_unit_busy(UnitId(0), false).unwrap();
    assert!(game.move_unit(P1, UnitId(0), GridPos::new(1, 1)).is_ok());
    assert_eq!(
        game.set_unit_busy(UnitId(4), true),
        Err(Rejection::UnknownUnit { unit: UnitId(4) })
    );
}
