//! Local fan-out of admin presses
//!
//! A press is emitted once and consumed independently by the physics
//! handler and the network publisher.

use tokio::sync::broadcast;

use crate::arena::Direction;

#[derive(Clone)]
pub struct MoveBus {
    tx: broadcast::Sender<Direction>,
}

impl MoveBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Direction> {
        self.tx.subscribe()
    }

    /// Emit a press; returns the number of consumers it reached
    pub fn emit(&self, direction: Direction) -> usize {
        self.tx.send(direction).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_consumers_see_each_press() {
        let bus = MoveBus::new(8);
        let mut physics = bus.subscribe();
        let mut publisher = bus.subscribe();

        assert_eq!(bus.emit(Direction::Left2), 2);
        assert_eq!(physics.try_recv().unwrap(), Direction::Left2);
        assert_eq!(publisher.try_recv().unwrap(), Direction::Left2);
    }

    #[test]
    fn emit_without_consumers_is_harmless() {
        let bus = MoveBus::new(8);
        assert_eq!(bus.emit(Direction::Up1), 0);
    }
}
