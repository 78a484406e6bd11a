//! Navigation lifecycle.
//!
//! The state machine turns user actions and position/orientation samples into
//! [`Command`]s for the renderer and UI collaborators. It never talks to the
//! collaborators itself.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::NavigationError;
use crate::geodesy::{distance_meters, heading_delta, initial_bearing_degrees, true_azimuth};
use crate::gnss::{Coordinate, OrientationSample, PositionSample};
use crate::magnetic::DeclinationModel;
use crate::target_store::TargetStore;

/// Distance below which the target counts as reached.
pub const ARRIVAL_THRESHOLD_M: f64 = 1.0;

/// Indicator rotation used when there is nothing to point at.
pub const NEUTRAL_HEADING: f32 = 0.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationState {
    #[default]
    Idle,
    TargetSet,
    Navigating,
    Arrived,
}

impl NavigationState {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::TargetSet => "TARGET_SET",
            Self::Navigating => "NAVIGATING",
            Self::Arrived => "ARRIVED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserAction {
    Mark,
    StartNav,
    StopNav,
    Reset,
}

impl UserAction {
    pub fn from_str_name(value: &str) -> Option<Self> {
        match value {
            "mark" => Some(Self::Mark),
            "start" => Some(Self::StartNav),
            "stop" => Some(Self::StopNav),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Output of a dispatched event, addressed to the renderer or the UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    PlaceMarker(Coordinate),
    RemoveMarker,
    PanAndZoomTo {
        coordinate: Coordinate,
        zoom_level: f32,
    },
    SetDistanceText(String),
    RotateIndicator(f32),
    ShowArrivalNotice,
    ShowWarning(String),
}

/// Distance readout as shown to the user.
pub fn format_distance(distance: f64) -> String {
    format!("{:.2}", distance)
}

#[derive(Debug)]
pub struct NavigationStateMachine<S, M> {
    state: NavigationState,
    target: Option<Coordinate>,
    last_position: Option<PositionSample>,
    marker_placed: bool,
    centered: bool,
    zoom_level: f32,
    startup_warning: Option<String>,
    store: S,
    declination: M,
}

impl<S, M> NavigationStateMachine<S, M>
where
    S: TargetStore,
    M: DeclinationModel,
{
    /// Creates the machine, restoring a persisted target if there is one.
    ///
    /// A failed load leaves the machine `Idle`; the failure is kept as a
    /// warning for [`Self::take_startup_warning`].
    pub fn new(store: S, declination: M, zoom_level: f32) -> Self {
        let (target, startup_warning) = match store.load() {
            Ok(target) => (target, None),
            Err(e) => {
                warn!("Could not restore waypoint: {}", e);
                (None, Some(format!("Could not restore waypoint: {e}")))
            }
        };
        let state = if target.is_some() {
            info!("Restored waypoint {:?}", target);
            NavigationState::TargetSet
        } else {
            NavigationState::Idle
        };
        NavigationStateMachine {
            state,
            target,
            last_position: None,
            marker_placed: false,
            centered: false,
            zoom_level,
            startup_warning,
            store,
            declination,
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn target(&self) -> Option<Coordinate> {
        self.target
    }

    pub fn last_position(&self) -> Option<&PositionSample> {
        self.last_position.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn take_startup_warning(&mut self) -> Option<String> {
        self.startup_warning.take()
    }

    pub fn handle_action(&mut self, action: UserAction) -> Vec<Command> {
        let result = match action {
            UserAction::Mark => self.mark(),
            UserAction::StartNav => self.start_navigation(),
            UserAction::StopNav => Ok(self.stop_navigation()),
            UserAction::Reset => Ok(self.reset()),
        };
        result.unwrap_or_else(|e| {
            debug!("Ignoring {:?}: {}", action, e);
            Vec::new()
        })
    }

    /// Out-of-range samples are dropped before they can become a target.
    pub fn handle_position(&mut self, sample: PositionSample) -> Vec<Command> {
        if !sample.coordinate.is_valid() {
            warn!("Dropping position outside coordinate range: {:?}", sample.coordinate);
            return Vec::new();
        }
        self.last_position = Some(sample);
        let mut commands = Vec::new();

        if !self.centered {
            self.centered = true;
            commands.push(Command::PanAndZoomTo {
                coordinate: sample.coordinate,
                zoom_level: self.zoom_level,
            });
            if let (Some(target), false) = (self.target, self.marker_placed) {
                commands.push(Command::PlaceMarker(target));
                self.marker_placed = true;
            }
        }

        if self.state != NavigationState::Navigating {
            return commands;
        }
        let Some(target) = self.target else {
            return commands;
        };

        let distance = distance_meters(sample.coordinate, target);
        if distance < ARRIVAL_THRESHOLD_M {
            info!("Arrived at waypoint {:?}", target);
            self.transition(NavigationState::Arrived);
            commands.push(Command::ShowArrivalNotice);
            commands.push(Command::SetDistanceText(String::new()));
            commands.push(Command::RotateIndicator(NEUTRAL_HEADING));
        } else {
            commands.push(Command::SetDistanceText(format_distance(distance)));
        }
        commands
    }

    pub fn handle_orientation(&mut self, sample: OrientationSample) -> Vec<Command> {
        self.orientation(sample).unwrap_or_else(|e| {
            debug!("Ignoring orientation sample: {}", e);
            Vec::new()
        })
    }

    fn orientation(&self, sample: OrientationSample) -> Result<Vec<Command>, NavigationError> {
        if self.state != NavigationState::Navigating {
            return Ok(Vec::new());
        }
        let target = self.target.ok_or(NavigationError::MissingTarget)?;
        let position = self
            .last_position
            .as_ref()
            .ok_or(NavigationError::StaleOrientation)?;

        // declination follows the last fix, not the orientation sample
        let declination = self.declination.declination_degrees(
            position.coordinate,
            position.altitude,
            position.timestamp,
        );
        let azimuth = true_azimuth(sample.raw_azimuth_degrees as f64, declination);
        let bearing = initial_bearing_degrees(position.coordinate, target);
        Ok(vec![Command::RotateIndicator(heading_delta(bearing, azimuth))])
    }

    fn mark(&mut self) -> Result<Vec<Command>, NavigationError> {
        let position = self
            .last_position
            .as_ref()
            .ok_or(NavigationError::NoPositionFix)?;
        let target = position.coordinate;
        let mut commands = Vec::new();

        if self.state == NavigationState::Navigating {
            commands.push(Command::SetDistanceText(String::new()));
        }
        if self.marker_placed {
            commands.push(Command::RemoveMarker);
        }
        if let Err(e) = self.store.save(target) {
            warn!("Could not save waypoint {:?}: {}", target, e);
            commands.push(Command::ShowWarning(format!("Could not save waypoint: {e}")));
        }
        commands.push(Command::PlaceMarker(target));
        self.marker_placed = true;

        info!("Marked waypoint {:?}", target);
        self.target = Some(target);
        self.transition(NavigationState::TargetSet);
        Ok(commands)
    }

    fn start_navigation(&mut self) -> Result<Vec<Command>, NavigationError> {
        if self.target.is_none() {
            return Err(NavigationError::MissingTarget);
        }
        match self.state {
            NavigationState::TargetSet | NavigationState::Arrived => {
                self.transition(NavigationState::Navigating);
            }
            NavigationState::Navigating => debug!("Already navigating"),
            NavigationState::Idle => return Err(NavigationError::MissingTarget),
        }
        Ok(Vec::new())
    }

    fn stop_navigation(&mut self) -> Vec<Command> {
        if self.state != NavigationState::Navigating {
            debug!("Not navigating, nothing to stop");
            return Vec::new();
        }
        self.transition(NavigationState::TargetSet);
        vec![Command::SetDistanceText(String::new())]
    }

    fn reset(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        if let Err(e) = self.store.clear() {
            warn!("Could not clear stored waypoint: {}", e);
            commands.push(Command::ShowWarning(format!(
                "Could not clear stored waypoint: {e}"
            )));
        }
        if self.marker_placed {
            commands.push(Command::RemoveMarker);
            self.marker_placed = false;
        }
        commands.push(Command::SetDistanceText(String::new()));
        commands.push(Command::RotateIndicator(NEUTRAL_HEADING));

        self.target = None;
        self.transition(NavigationState::Idle);
        commands
    }

    fn transition(&mut self, next: NavigationState) {
        if self.state != next {
            info!(
                "Navigation {} -> {}",
                self.state.as_str_name(),
                next.as_str_name()
            );
            self.state = next;
        }
    }
}
