//! Shared live state guarded by one lock and one condition variable.
//!
//! Every stage that changes readiness stores its result and then notifies
//! all waiters. Waiters re-check their predicate after every wakeup.

use super::catalog::PortFormatCatalog;
use super::negotiation::Negotiation;
use crate::clock::ClockTime;
use crate::config::{CameraConfiguration, ComponentConfig, FixateDefaults, HardwareTarget};
use crate::error::{Error, Result};
use crate::il::{ComponentRole, IlComponent, PortHandle, PortRole};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Frame counters used for timestamps and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timing {
    /// Running time within the current format.
    pub running_time: ClockTime,
    /// Frames produced within the current format.
    pub n_frames: u64,
    /// Running time accumulated over previous formats.
    pub accum_rtime: ClockTime,
    /// Frames accumulated over previous formats.
    pub accum_frames: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            running_time: ClockTime::ZERO,
            n_frames: 0,
            accum_rtime: ClockTime::ZERO,
            accum_frames: 0,
        }
    }
}

impl Timing {
    /// Fold the current format's counters into the accumulated base.
    pub fn fold(&mut self) {
        self.accum_rtime = self.accum_rtime.saturating_add(self.running_time);
        self.accum_frames += self.n_frames;
        self.running_time = ClockTime::ZERO;
        self.n_frames = 0;
    }
}

pub(crate) struct LiveState {
    pub target: HardwareTarget,
    pub component: ComponentConfig,
    pub fixate: FixateDefaults,
    pub config: CameraConfiguration,
    pub components: [Option<Arc<dyn IlComponent>>; 3],
    pub ports: [Option<PortHandle>; 6],
    pub camera_configured: bool,
    pub video_configured: bool,
    pub catalog: PortFormatCatalog,
    pub negotiation: Negotiation,
    pub timing: Timing,
}

impl LiveState {
    pub fn new(
        target: HardwareTarget,
        component: ComponentConfig,
        fixate: FixateDefaults,
        config: CameraConfiguration,
    ) -> Self {
        Self {
            target,
            component,
            fixate,
            config,
            components: [None, None, None],
            ports: [None, None, None, None, None, None],
            camera_configured: false,
            video_configured: false,
            catalog: PortFormatCatalog::new(target),
            negotiation: Negotiation::default(),
            timing: Timing::default(),
        }
    }

    pub fn component(&self, role: ComponentRole) -> Option<&Arc<dyn IlComponent>> {
        self.components[role.index()].as_ref()
    }

    pub fn require_component(&self, role: ComponentRole) -> Result<&Arc<dyn IlComponent>> {
        self.component(role).ok_or(Error::ComponentMissing(role))
    }

    pub fn port(&self, role: PortRole) -> Option<&PortHandle> {
        self.ports[role.index()].as_ref()
    }

    pub fn require_port(&self, role: PortRole) -> Result<&PortHandle> {
        self.port(role).ok_or(Error::PortMissing(role))
    }

    /// Ports currently opened, in enable order.
    pub fn opened_ports(&self) -> impl Iterator<Item = (PortRole, &PortHandle)> {
        PortRole::ALL
            .into_iter()
            .filter_map(|role| self.port(role).map(|p| (role, p)))
    }

    /// Read the capture toggle of the camera video output. Any failure
    /// counts as not capturing.
    pub fn is_capture_active(&self) -> bool {
        use crate::il::{Config, ConfigKey};

        let (Some(camera), Some(port)) = (
            self.component(ComponentRole::Camera),
            self.port(PortRole::CameraVideoOut),
        ) else {
            return false;
        };
        match camera.get_config(ConfigKey::Capturing { port: port.index() }) {
            Ok(Config::Capturing { enabled, .. }) => enabled,
            Ok(_) => false,
            Err(err) => {
                tracing::error!(error = %err, "error while checking video capture state");
                false
            }
        }
    }
}

/// Live state plus its condition variable.
pub(crate) struct Live {
    state: Mutex<LiveState>,
    changed: Condvar,
}

impl Live {
    pub fn new(state: LiveState) -> Self {
        Self {
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, LiveState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wake every waiter.
    pub fn broadcast(&self) {
        self.changed.notify_all();
    }

    /// Block until `ready` holds, releasing the lock while waiting.
    pub fn wait_until<'a>(
        &self,
        mut guard: MutexGuard<'a, LiveState>,
        what: &'static str,
        mut ready: impl FnMut(&LiveState) -> bool,
    ) -> MutexGuard<'a, LiveState> {
        while !ready(&guard) {
            tracing::debug!("{what}, waiting");
            guard = self
                .changed
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
        guard
    }
}
