use proptest::prelude::*;

use pocketciv::{
    testing::GameBuilder, unit::UnitStats, GridPos, PlayerId, Rejection, Terrain, UnitId,
};

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

fn terrain_strategy() -> impl Strategy<Value = Terrain> {
    prop_oneof![
        4 => Just(Terrain::Grass),
        1 => Just(Terrain::Water),
        1 => Just(Terrain::Forest),
        1 => Just(Terrain::Mountain),
    ]
}

proptest! {
    #[test]
    fn city_purchase_succeeds_iff_affordable(gold in 0u32..60, coal in 0u32..5) {
        let mut game = GameBuilder::new()
            .grid(5, 5, Terrain::Grass)
            .unit(1, (2, 2))
            .wallet(1, gold, coal)
            .build()
            .unwrap();

        let result = game.build_city(P1, GridPos::new(2, 2));
        let wallet = game.wallet(P1).unwrap();
        if gold >= 20 {
            prop_assert!(result.is_ok());
            prop_assert_eq!((wallet.gold, wallet.coal), (gold - 20, coal));
        } else {
            prop_assert_eq!(result, Err(Rejection::InsufficientFunds { gold: 20, coal: 0 }));
            prop_assert_eq!((wallet.gold, wallet.coal), (gold, coal));
        }
    }

    #[test]
    fn reachable_tiles_are_legal(
        map in prop::collection::vec(terrain_strategy(), 81),
        blockers in prop::collection::vec((0i32..9, 0i32..9), 0..8),
        start in (0i32..9, 0i32..9),
        spend in 0u32..4,
    ) {
        let mut builder = GameBuilder::new().terrain(start, Terrain::Grass);
        for (index, terrain) in map.iter().enumerate() {
            let pos = GridPos::new(index as i32 % 9, index as i32 / 9);
            if pos != GridPos::from(start) {
                builder = builder.terrain(pos, *terrain);
            }
        }
        builder = builder.unit(1, start);
        let mut placed = vec![GridPos::from(start)];
        for blocker in blockers {
            let pos = GridPos::from(blocker);
            if !placed.contains(&pos) {
                placed.push(pos);
                builder = builder.unit(2, pos);
            }
        }
        let mut game = builder.build().unwrap();
        let origin = GridPos::from(start);

        // Burn some move points with a one-tile step when one is available.
        let mut moves = 3;
        let mut at = origin;
        if spend > 0 {
            if let Some(step) = game.reachable_tiles(UnitId(0)).into_iter().find(|pos| pos.chebyshev(origin) == 1) {
                game.move_unit(P1, UnitId(0), step).unwrap();
                moves = 2;
                at = step;
            }
        }

        for pos in game.reachable_tiles(UnitId(0)) {
            let distance = pos.chebyshev(at);
            prop_assert!(distance >= 1 && distance <= moves);
            let tile = game.tile(pos).unwrap();
            prop_assert!(tile.unit.is_none());
            prop_assert_ne!(tile.terrain, Terrain::Water);
        }
        prop_assert!(game.world().occupancy_consistent());
    }

    #[test]
    fn capture_never_steals_or_floods(
        map in prop::collection::vec(terrain_strategy(), 49),
        foreign in prop::collection::vec((0i32..7, 0i32..7), 0..10),
    ) {
        let mut builder = GameBuilder::new().wallet(1, 20, 0);
        for (index, terrain) in map.iter().enumerate() {
            builder = builder.terrain((index as i32 % 7, index as i32 / 7), *terrain);
        }
        builder = builder.terrain((3, 3), Terrain::Grass).unit(1, (3, 3));
        for pos in &foreign {
            if *pos != (3, 3) {
                builder = builder.owner(*pos, 2);
            }
        }
        let mut game = builder.build().unwrap();
        let before = game.snapshot();

        let report = game.build_city(P1, GridPos::new(3, 3)).unwrap();

        for tile in before.tiles {
            let now = game.tile(tile.pos).unwrap();
            if tile.owner == Some(P2) {
                prop_assert_eq!(now.owner, Some(P2));
            } else if tile.pos.chebyshev(GridPos::new(3, 3)) <= 2 && tile.terrain != Terrain::Water {
                prop_assert_eq!(now.owner, Some(P1));
            } else if tile.pos != GridPos::new(3, 3) {
                prop_assert_eq!(now.owner, None);
            }
        }
        prop_assert!(!report.captured.is_empty());
    }

    #[test]
    fn combat_never_heals(
        attack in 0u32..12,
        defense in 0u32..6,
        counter_attack in 0u32..12,
        terrain in terrain_strategy().prop_filter("land", |t| *t != Terrain::Water),
    ) {
        let mut game = GameBuilder::new()
            .grid(2, 1, Terrain::Grass)
            .terrain((1, 0), terrain)
            .tweak_rules(|rules| {
                rules.units.insert("a".into(), UnitStats { attack, ..UnitStats::default() });
                rules.units.insert("d".into(), UnitStats { attack: counter_attack, defense, ..UnitStats::default() });
            })
            .unit_of_class(1, (0, 0), "a")
            .unit_of_class(2, (1, 0), "d")
            .build()
            .unwrap();

        let report = game.attack(P1, UnitId(0), UnitId(1)).unwrap();

        prop_assert!(report.defender_hp <= 10);
        prop_assert!(report.attacker_hp <= 10);
        prop_assert_eq!(report.defender_hp, 10 - report.damage_dealt.min(10));
        prop_assert_eq!(report.defender_died, report.defender_hp == 0);
        prop_assert!(game.world().occupancy_consistent());
        if let Some(attacker) = game.unit(UnitId(0)) {
            prop_assert_eq!(attacker.moves_left, 0);
        }
    }

    #[test]
    fn income_lands_once_per_round(rounds in 0u32..8) {
        let mut game = GameBuilder::new()
            .grid(2, 2, Terrain::Grass)
            .build()
            .unwrap();

        for _ in 0..rounds {
            game.end_turn(P1).unwrap();
            game.end_turn(P2).unwrap();
        }
        // A mid-round handoff never pays.
        game.end_turn(P1).unwrap();

        for player in [P1, P2] {
            let wallet = game.wallet(player).unwrap();
            prop_assert_eq!(wallet.gold, 10 + 5 * rounds);
            prop_assert_eq!(wallet.coal, 10 + 5 * rounds);
        }
        prop_assert_eq!(game.turn(), 1 + rounds);
    }
}
