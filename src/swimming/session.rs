//! Sessions bundling a field probe with the integrators that use it.

use super::{longitudinal::LongitudinalSwimmer, path::PathSwimmer, swimmer::SwimmerConfig};
use crate::field::FieldProbe;

/// A field probe together with the integrators swimming through it.
///
/// The integrators keep scratch state between steps, so a session must
/// only be used by one worker at a time. Every swim takes `&mut self`.
#[derive(Clone, Debug)]
pub struct SwimSession<P> {
    config: SwimmerConfig,
    probe: P,
    longitudinal: LongitudinalSwimmer,
    path: PathSwimmer,
}

/// Parts of a session borrowed separately for the duration of one swim.
pub(crate) struct SessionParts<'a, P> {
    pub config: &'a SwimmerConfig,
    pub probe: &'a P,
    pub longitudinal: &'a mut LongitudinalSwimmer,
    pub path: &'a mut PathSwimmer,
}

/// Factory for `SwimSession` objects sharing the same probe and configuration.
#[derive(Clone, Debug)]
pub struct SwimSessionFactory<P> {
    config: SwimmerConfig,
    probe: P,
}

impl<P: FieldProbe> SwimSession<P> {
    /// Creates a new session swimming through the given probe.
    pub fn new(probe: P, config: SwimmerConfig) -> Self {
        config.validate();
        let longitudinal = LongitudinalSwimmer::new(config.longitudinal.clone());
        let path = PathSwimmer::new(config.path.clone());
        SwimSession {
            config,
            probe,
            longitudinal,
            path,
        }
    }

    /// Returns the configuration of the session.
    pub fn config(&self) -> &SwimmerConfig {
        &self.config
    }

    /// Returns the field probe of the session.
    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub(crate) fn parts(&mut self) -> SessionParts<'_, P> {
        SessionParts {
            config: &self.config,
            probe: &self.probe,
            longitudinal: &mut self.longitudinal,
            path: &mut self.path,
        }
    }
}

impl<P: FieldProbe + Clone> SwimSessionFactory<P> {
    /// Creates a new factory for sessions swimming through the given probe.
    ///
    /// The probe is cloned for every session, so large field maps should be
    /// wrapped in an `Arc`.
    pub fn new(probe: P, config: SwimmerConfig) -> Self {
        config.validate();
        SwimSessionFactory { config, probe }
    }

    /// Creates a new session.
    pub fn produce(&self) -> SwimSession<P> {
        SwimSession::new(self.probe.clone(), self.config.clone())
    }
}
