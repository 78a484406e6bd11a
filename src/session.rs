//! Session façade.
//!
//! `NavigationSession` owns the state machine and is the only entry point for
//! the position source, the orientation source and the user-action source.
//! Commands produced by each dispatch are pushed to the attached renderer and
//! indicator and folded into a snapshot for pull-based readers.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::gnss::{Coordinate, OrientationSample, PositionSample};
use crate::magnetic::DeclinationModel;
use crate::navigation::{Command, NavigationState, NavigationStateMachine, UserAction};
use crate::target_store::TargetStore;

/// Map collaborator. Receives commands only.
pub trait Renderer {
    fn place_marker(&mut self, coordinate: Coordinate);
    fn remove_marker(&mut self);
    fn pan_and_zoom_to(&mut self, coordinate: Coordinate, zoom_level: f32);
}

/// UI collaborator for the distance readout and the direction indicator.
pub trait Indicator {
    fn set_distance_text(&mut self, text: &str);
    fn rotate_indicator(&mut self, degrees: f32);
    fn show_arrival_notice(&mut self);
    fn show_warning(&mut self, message: &str);
}

/// One queued input for the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    UserAction(UserAction),
    Position(PositionSample),
    Orientation(OrientationSample),
}

/// Last marker instruction sent to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum MarkerCommand {
    Place(Coordinate),
    Remove,
}

/// Snapshot of everything the collaborators have been told so far.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    pub state: NavigationState,
    pub distance_text: String,
    pub heading_delta: Option<f32>,
    pub marker_command: Option<MarkerCommand>,
    /// Set when the target was reached, cleared by the next user action.
    pub arrival_notice: bool,
    /// Latest non-fatal warning, cleared by the next user action.
    pub warning: Option<String>,
}

impl Outputs {
    fn apply(&mut self, command: &Command) {
        match command {
            Command::PlaceMarker(c) => self.marker_command = Some(MarkerCommand::Place(*c)),
            Command::RemoveMarker => self.marker_command = Some(MarkerCommand::Remove),
            Command::PanAndZoomTo { .. } => {}
            Command::SetDistanceText(text) => self.distance_text.clone_from(text),
            Command::RotateIndicator(degrees) => self.heading_delta = Some(*degrees),
            Command::ShowArrivalNotice => self.arrival_notice = true,
            Command::ShowWarning(message) => self.warning = Some(message.clone()),
        }
    }
}

pub struct NavigationSession<S, M> {
    machine: NavigationStateMachine<S, M>,
    outputs: Outputs,
    renderer: Option<Box<dyn Renderer + Send>>,
    indicator: Option<Box<dyn Indicator + Send>>,
}

impl<S, M> NavigationSession<S, M>
where
    S: TargetStore,
    M: DeclinationModel,
{
    pub fn new(store: S, declination: M, zoom_level: f32) -> Self {
        let mut machine = NavigationStateMachine::new(store, declination, zoom_level);
        let mut outputs = Outputs {
            state: machine.state(),
            ..Outputs::default()
        };
        if let Some(warning) = machine.take_startup_warning() {
            outputs.apply(&Command::ShowWarning(warning));
        }
        NavigationSession {
            machine,
            outputs,
            renderer: None,
            indicator: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer + Send>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Attaches the UI collaborator and replays a pending startup warning to it.
    pub fn with_indicator(mut self, mut indicator: Box<dyn Indicator + Send>) -> Self {
        if let Some(warning) = &self.outputs.warning {
            indicator.show_warning(warning);
        }
        self.indicator = Some(indicator);
        self
    }

    pub fn state(&self) -> NavigationState {
        self.machine.state()
    }

    pub fn target(&self) -> Option<Coordinate> {
        self.machine.target()
    }

    pub fn machine(&self) -> &NavigationStateMachine<S, M> {
        &self.machine
    }

    pub fn on_user_action(&mut self, action: UserAction) -> Vec<Command> {
        self.outputs.arrival_notice = false;
        self.outputs.warning = None;
        let commands = self.machine.handle_action(action);
        self.publish(commands)
    }

    pub fn on_position_sample(&mut self, sample: PositionSample) -> Vec<Command> {
        let commands = self.machine.handle_position(sample);
        self.publish(commands)
    }

    pub fn on_orientation_sample(&mut self, sample: OrientationSample) -> Vec<Command> {
        let commands = self.machine.handle_orientation(sample);
        self.publish(commands)
    }

    /// Routes a queued event to the matching entry point.
    pub fn dispatch(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::UserAction(action) => self.on_user_action(action),
            Event::Position(sample) => self.on_position_sample(sample),
            Event::Orientation(sample) => self.on_orientation_sample(sample),
        }
    }

    pub fn current_outputs(&self) -> Outputs {
        self.outputs.clone()
    }

    fn publish(&mut self, commands: Vec<Command>) -> Vec<Command> {
        for command in &commands {
            trace!("Forwarding {:?}", command);
            self.outputs.apply(command);
            self.forward(command);
        }
        self.outputs.state = self.machine.state();
        commands
    }

    fn forward(&mut self, command: &Command) {
        if let Some(renderer) = self.renderer.as_mut() {
            match command {
                Command::PlaceMarker(c) => renderer.place_marker(*c),
                Command::RemoveMarker => renderer.remove_marker(),
                Command::PanAndZoomTo {
                    coordinate,
                    zoom_level,
                } => renderer.pan_and_zoom_to(*coordinate, *zoom_level),
                _ => {}
            }
        }
        if let Some(indicator) = self.indicator.as_mut() {
            match command {
                Command::SetDistanceText(text) => indicator.set_distance_text(text),
                Command::RotateIndicator(degrees) => indicator.rotate_indicator(*degrees),
                Command::ShowArrivalNotice => indicator.show_arrival_notice(),
                Command::ShowWarning(message) => indicator.show_warning(message),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magnetic::FixedDeclination;
    use crate::target_store::MemoryTargetStore;
    use chrono::Utc;

    fn fix(latitude: f64, longitude: f64) -> PositionSample {
        PositionSample::new(Coordinate::new(latitude, longitude), 0.0, Utc::now())
    }

    #[test]
    fn test_snapshot_tracks_commands() {
        let mut session =
            NavigationSession::new(MemoryTargetStore::new(), FixedDeclination(0.0), 15.0);
        assert_eq!(session.current_outputs(), Outputs::default());

        session.dispatch(Event::Position(fix(40.0, -74.0)));
        session.dispatch(Event::UserAction(UserAction::Mark));
        session.dispatch(Event::UserAction(UserAction::StartNav));
        session.dispatch(Event::Position(fix(40.00002, -74.0)));

        let outputs = session.current_outputs();
        assert_eq!(outputs.state, NavigationState::Navigating);
        assert_eq!(outputs.distance_text, "2.22");
        assert_eq!(
            outputs.marker_command,
            Some(MarkerCommand::Place(Coordinate::new(40.0, -74.0)))
        );
        assert!(!outputs.arrival_notice);

        session.dispatch(Event::Position(fix(40.0, -74.0)));
        let outputs = session.current_outputs();
        assert_eq!(outputs.state, NavigationState::Arrived);
        assert!(outputs.arrival_notice);
        assert_eq!(outputs.distance_text, "");
        assert_eq!(outputs.heading_delta, Some(0.0));

        session.on_user_action(UserAction::Reset);
        let outputs = session.current_outputs();
        assert_eq!(outputs.state, NavigationState::Idle);
        assert!(!outputs.arrival_notice);
        assert_eq!(outputs.marker_command, Some(MarkerCommand::Remove));
    }
}
