//! Change notifications for the presentation layer.
//!
//! Rule systems push [`GameEvent`]s into the world's queue while a command
//! executes. When the command completes, [`Game`](crate::game::Game) drains
//! the queue and hands every event to the registered observers, so observers
//! never see a half-applied command.

use serde::Serialize;

use crate::deposit::ResourceKind;
use crate::grid::GridPos;
use crate::tile::PlayerId;
use crate::unit::UnitId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    WalletChanged {
        player: PlayerId,
        gold: u32,
        coal: u32,
        gold_income: u32,
        coal_income: u32,
    },
    TurnChanged {
        turn: u32,
    },
    ActivePlayerChanged {
        player: PlayerId,
    },
    UnitHealthChanged {
        unit: UnitId,
        hp: u32,
        max_hp: u32,
    },
    UnitMoved {
        unit: UnitId,
        from: GridPos,
        to: GridPos,
        moves_left: u32,
    },
    UnitDied {
        unit: UnitId,
        owner: PlayerId,
        at: GridPos,
    },
    UnitRecruited {
        unit: UnitId,
        owner: PlayerId,
        at: GridPos,
    },
    CityFounded {
        owner: PlayerId,
        at: GridPos,
    },
    MineBuilt {
        owner: PlayerId,
        at: GridPos,
        kind: ResourceKind,
    },
    TerritoryCaptured {
        owner: PlayerId,
        center: GridPos,
        tiles: Vec<GridPos>,
    },
    IncomeApplied {
        player: PlayerId,
        at: GridPos,
        kind: ResourceKind,
        amount: u32,
    },
}

/// Receives events after each completed command.
pub trait GameObserver: Send {
    fn on_event(&mut self, event: &GameEvent);
}

/// Pending events produced by the command currently executing.
#[derive(Debug, Default, Clone)]
pub struct EventQueue {
    pending: Vec<GameEvent>,
}

impl EventQueue {
    pub(crate) fn push(&mut self, event: GameEvent) {
        self.pending.push(event);
    }

    pub(crate) fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Fan-out to registered observers.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<Box<dyn GameObserver>>,
}

impl EventBus {
    pub fn register(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn publish(&mut self, events: &[GameEvent]) {
        for event in events {
            for observer in self.observers.iter_mut() {
                observer.on_event(event);
            }
        }
    }
}

/// Writes every event to the debug log.
#[derive(Debug, Default)]
pub struct LogObserver;

impl GameObserver for LogObserver {
    fn on_event(&mut self, event: &GameEvent) {
        tracing::debug!(?event, "game event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Collect(Arc<Mutex<Vec<GameEvent>>>);

    impl GameObserver for Collect {
        fn on_event(&mut self, event: &GameEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_bus_delivers_in_order_to_every_observer() {
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::default();
        bus.register(Box::new(Collect(first.clone())));
        bus.register(Box::new(Collect(second.clone())));

        let mut queue = EventQueue::default();
        queue.push(GameEvent::TurnChanged { turn: 2 });
        queue.push(GameEvent::ActivePlayerChanged {
            player: PlayerId(1),
        });
        bus.publish(&queue.drain());

        assert!(queue.is_empty());
        assert_eq!(first.lock().unwrap().len(), 2);
        assert_eq!(*first.lock().unwrap(), *second.lock().unwrap());
        assert_eq!(first.lock().unwrap()[0], GameEvent::TurnChanged { turn: 2 });
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let json = serde_json::to_string(&GameEvent::TurnChanged { turn: 3 }).unwrap();
        assert_eq!(json, r#"{"event":"turn_changed","turn":3}"#);
    }
}
