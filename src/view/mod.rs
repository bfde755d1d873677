//! Per-client "Current Move" view state

use uuid::Uuid;

use crate::arena::{ArenaError, Direction};
use crate::ws::protocol::Role;

/// Relay connectivity as seen by a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Connected,
    Disconnected,
}

/// View errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    #[error("Viewer state is read-only")]
    ReadOnly,
}

/// Last-known direction of one client, plus its connectivity.
///
/// Viewers only change through relay delivery. Admins also change on local
/// presses; their own echoes coming back from the relay are dropped unless a
/// refused press left the label behind the relay.
#[derive(Debug, Clone)]
pub struct ViewState {
    role: Role,
    conn_id: Uuid,
    last_direction: Option<Direction>,
    connectivity: Connectivity,
    /// Last direction the relay carried, from any origin
    relayed: Option<Direction>,
    /// Presses sent but neither echoed nor refused yet
    in_flight: u32,
    /// Follow own echoes until `in_flight` drains
    resync: bool,
}

impl ViewState {
    pub fn new(role: Role, conn_id: Uuid) -> Self {
        Self {
            role,
            conn_id,
            last_direction: None,
            connectivity: Connectivity::Connected,
            relayed: None,
            in_flight: 0,
            resync: false,
        }
    }

    pub fn admin(conn_id: Uuid) -> Self {
        Self::new(Role::Admin, conn_id)
    }

    pub fn viewer(conn_id: Uuid) -> Self {
        Self::new(Role::Viewer, conn_id)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    /// Rebind to the id the server assigned on connect
    pub fn set_conn_id(&mut self, conn_id: Uuid) {
        self.conn_id = conn_id;
    }

    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Local button press (admin only), applied optimistically
    pub fn press(&mut self, direction: Direction) -> Result<(), ViewError> {
        if self.role != Role::Admin {
            return Err(ViewError::ReadOnly);
        }
        self.last_direction = Some(direction);
        if self.connectivity == Connectivity::Connected {
            self.in_flight += 1;
        }
        Ok(())
    }

    /// Relay delivery; returns whether the label changed hands to `direction`.
    /// This client's own echo is ignored while its press is still current.
    pub fn apply_remote(&mut self, origin: Uuid, direction: Direction) -> bool {
        self.relayed = Some(direction);
        if origin != self.conn_id {
            self.last_direction = Some(direction);
            return true;
        }

        self.in_flight = self.in_flight.saturating_sub(1);
        let applied = self.resync;
        if applied {
            self.last_direction = Some(direction);
        }
        if self.in_flight == 0 {
            self.resync = false;
        }
        applied
    }

    /// The server refused one of this client's presses: fall back to what
    /// the relay last carried, and follow own echoes of presses still pending
    pub fn reject_press(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.last_direction = self.relayed;
        self.resync = self.in_flight > 0;
    }

    /// Relay delivery of an unparsed direction; unknown identifiers leave state untouched
    pub fn apply_wire(&mut self, origin: Uuid, direction: &str) -> Result<bool, ArenaError> {
        let direction: Direction = direction.parse()?;
        Ok(self.apply_remote(origin, direction))
    }

    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        self.connectivity = connectivity;
        if connectivity == Connectivity::Disconnected {
            // Nothing pending will be echoed anymore
            self.in_flight = 0;
            self.resync = false;
        }
    }

    /// Rendered label
    pub fn label(&self) -> String {
        let current = self
            .last_direction
            .map(|d| d.as_str())
            .unwrap_or("None");

        match self.connectivity {
            Connectivity::Connected => format!("Current Move: {current}"),
            Connectivity::Disconnected => format!("Current Move: {current} (disconnected)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_as_none() {
        let view = ViewState::viewer(Uuid::new_v4());
        assert_eq!(view.last_direction(), None);
        assert_eq!(view.label(), "Current Move: None");
    }

    #[test]
    fn viewer_cannot_press() {
        let mut view = ViewState::viewer(Uuid::new_v4());
        assert_eq!(view.press(Direction::Up1), Err(ViewError::ReadOnly));
        assert_eq!(view.last_direction(), None);
    }

    #[test]
    fn admin_press_is_optimistic_and_self_echo_is_ignored() {
        let me = Uuid::new_v4();
        let mut view = ViewState::admin(me);
        view.press(Direction::Right2).unwrap();
        assert_eq!(view.label(), "Current Move: right2");

        // A stale self-echo must not flicker the label back.
        assert!(!view.apply_remote(me, Direction::Up1));
        assert_eq!(view.last_direction(), Some(Direction::Right2));

        // Another admin device still updates it.
        assert!(view.apply_remote(Uuid::new_v4(), Direction::Up1));
        assert_eq!(view.last_direction(), Some(Direction::Up1));
    }

    #[test]
    fn refused_press_falls_back_to_relayed_direction() {
        let me = Uuid::new_v4();
        let mut view = ViewState::admin(me);
        view.apply_remote(Uuid::new_v4(), Direction::Left1);

        view.press(Direction::Up2).unwrap();
        view.reject_press();
        assert_eq!(view.label(), "Current Move: left1");
    }

    #[test]
    fn refusal_before_pending_echo_follows_the_echo() {
        let me = Uuid::new_v4();
        let mut view = ViewState::admin(me);
        view.press(Direction::Up1).unwrap();
        view.press(Direction::Down2).unwrap();
        view.press(Direction::Right1).unwrap();

        // down2 refused while up1 and right1 are still on their way
        view.reject_press();
        assert_eq!(view.last_direction(), None);

        assert!(view.apply_remote(me, Direction::Up1));
        assert_eq!(view.last_direction(), Some(Direction::Up1));
        assert!(view.apply_remote(me, Direction::Right1));
        assert_eq!(view.last_direction(), Some(Direction::Right1));

        // Settled: later echoes are suppressed again
        view.press(Direction::Left2).unwrap();
        assert!(!view.apply_remote(me, Direction::Right1));
        assert_eq!(view.last_direction(), Some(Direction::Left2));
    }

    #[test]
    fn unknown_wire_direction_leaves_state_unchanged() {
        let mut view = ViewState::viewer(Uuid::new_v4());
        view.apply_remote(Uuid::new_v4(), Direction::Left2);

        let err = view.apply_wire(Uuid::new_v4(), "diagonal1").unwrap_err();
        assert_eq!(err, ArenaError::UnknownDirection("diagonal1".into()));
        assert_eq!(view.last_direction(), Some(Direction::Left2));
    }

    #[test]
    fn disconnection_is_visible() {
        let mut view = ViewState::viewer(Uuid::new_v4());
        view.apply_wire(Uuid::new_v4(), "down1").unwrap();
        view.set_connectivity(Connectivity::Disconnected);
        assert_eq!(view.label(), "Current Move: down1 (disconnected)");

        view.set_connectivity(Connectivity::Connected);
        assert_eq!(view.label(), "Current Move: down1");
    }
}
