use std::sync::{Arc, Mutex};

use pocketciv::{
    deposit::ResourceKind,
    events::{GameEvent, GameObserver},
    testing::GameBuilder,
    Command, CommandOutcome, GridPos, PlayerId, Rejection, Terrain, UnitId,
};

const P1: PlayerId = PlayerId(1);
const P2: PlayerId = PlayerId(2);

struct Recorder(Arc<Mutex<Vec<GameEvent>>>);

impl GameObserver for Recorder {
    fn on_event(&mut self, event: &GameEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

#[test]
fn round_applies_income_once_and_restores_moves() {
    let mut game = GameBuilder::new()
        .grid(8, 3, Terrain::Grass)
        .deposit((0, 1), ResourceKind::Gold)
        .deposit((7, 1), ResourceKind::Coal)
        .city((1, 1), 1)
        .city((6, 1), 2)
        .unit(1, (2, 0))
        .build()
        .unwrap();
    game.move_unit(P1, UnitId(0), GridPos::new(4, 0)).unwrap();

    let handoff = game.end_turn(P1).unwrap();
    assert!(!handoff.round_completed);
    assert_eq!(handoff.turn, 1);
    assert_eq!(game.active_player(), P2);
    assert_eq!(game.wallet(P1).unwrap().gold, 10);
    assert_eq!(game.unit(UnitId(0)).unwrap().moves_left, 1);

    let round = game.end_turn(P2).unwrap();
    assert!(round.round_completed);
    assert_eq!(round.turn, 2);
    assert_eq!(game.turn(), 2);
    assert_eq!(game.active_player(), P1);

    let p1 = game.wallet(P1).unwrap();
    let p2 = game.wallet(P2).unwrap();
    assert_eq!((p1.gold, p1.coal), (15, 10));
    assert_eq!((p2.gold, p2.coal), (10, 15));
    assert_eq!(round.income_applied.len(), 2);
    assert_eq!(round.income_applied[0].gold, 5);
    assert_eq!(round.income_applied[1].coal, 5);
    assert_eq!(game.unit(UnitId(0)).unwrap().moves_left, 3);
}

#[test]
fn players_without_deposits_get_nothing_when_deposits_exist() {
    let mut game = GameBuilder::new()
        .grid(8, 3, Terrain::Grass)
        .deposit((0, 1), ResourceKind::Gold)
        .city((1, 1), 1)
        .build()
        .unwrap();

    game.end_turn(P1).unwrap();
    game.end_turn(P2).unwrap();

    assert_eq!(game.wallet(P1).unwrap().gold, 15);
    let p2 = game.wallet(P2).unwrap();
    assert_eq!((p2.gold, p2.coal), (10, 10));
}

#[test]
fn only_the_active_player_can_end() {
    let mut game = GameBuilder::new()
        .grid(2, 2, Terrain::Grass)
        .build()
        .unwrap();

    assert_eq!(game.end_turn(P2), Err(Rejection::NotYourTurn));
    game.end_turn(P1).unwrap();
    assert_eq!(game.end_turn(P1), Err(Rejection::NotYourTurn));
    assert!(game.has_ended_turn(P1));
    assert_eq!(game.turn(), 1);
}

#[test]
fn three_players_rotate_in_order() {
    let mut game = GameBuilder::new()
        .players(&[3, 1, 2])
        .grid(2, 2, Terrain::Grass)
        .build()
        .unwrap();

    assert_eq!(game.active_player(), PlayerId(3));
    game.end_turn(PlayerId(3)).unwrap();
    assert_eq!(game.active_player(), P1);
    game.end_turn(P1).unwrap();
    assert_eq!(game.active_player(), P2);
    let report = game.end_turn(P2).unwrap();

    assert!(report.round_completed);
    assert_eq!(report.active, PlayerId(3));
    // No deposits on the map: the fallback income applies to everyone.
    for player in [1, 2, 3] {
        let wallet = game.wallet(PlayerId(player)).unwrap();
        assert_eq!((wallet.gold, wallet.coal), (15, 15));
    }
}

#[test]
fn round_events_reach_observers() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut game = GameBuilder::new()
        .grid(5, 3, Terrain::Grass)
        .deposit((0, 0), ResourceKind::Gold)
        .city((1, 1), 1)
        .build()
        .unwrap();
    game.register_observer(Box::new(Recorder(events.clone())));

    assert!(game.apply(P1, Command::EndTurn).is_success());
    assert!(events
        .lock()
        .unwrap()
        .contains(&GameEvent::ActivePlayerChanged { player: P2 }));

    let outcome = game.apply(P2, Command::EndTurn);
    assert!(matches!(outcome, CommandOutcome::TurnEnded(ref report) if report.round_completed));

    let seen = events.lock().unwrap();
    assert!(seen.contains(&GameEvent::TurnChanged { turn: 2 }));
    assert!(seen.contains(&GameEvent::IncomeApplied {
        player: P1,
        at: GridPos::new(0, 0),
        kind: ResourceKind::Gold,
        amount: 5,
    }));
    assert_eq!(
        seen.last(),
        Some(&GameEvent::ActivePlayerChanged { player: P1 })
    );
}

#[test]
fn apply_reports_rejections() {
    let mut game = GameBuilder::new()
        .grid(2, 2, Terrain::Grass)
        .build()
        .unwrap();

    let outcome = game.apply(P2, Command::EndTurn);

    assert!(!outcome.is_success());
    assert_eq!(outcome.rejection(), Some(&Rejection::NotYourTurn));
}
