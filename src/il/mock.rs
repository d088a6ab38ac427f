//! In-memory components for tests and benchmarks.
//!
//! [`MockCore`] hands out [`MockComponent`]s registered by name. Every call
//! that changes component state is appended to a journal shared by all
//! components of the core, so tests can assert on cross-component ordering.
//!
//! Output ports hold a fragment queue: [`MockComponent::push_fragment`]
//! feeds it and [`IlComponent::acquire_buffer`] blocks on it the way a
//! bounded queue blocks its consumer.
//!
//! ```rust
//! use omxcamsrc::il::mock::MockCore;
//! use omxcamsrc::il::{IlComponent, IlCore, PortDirection};
//!
//! let core = MockCore::new();
//! core.add_component("OMX.test.camera", &[(0, PortDirection::Input), (1, PortDirection::Output)]);
//! let camera = core.create_component("core", "OMX.test.camera", None).unwrap();
//! camera.add_all_ports().unwrap();
//! assert!(camera.has_port(1));
//! ```

use super::types::{
    Acquire, ColorFormat, ComponentState, CompressionFormat, Config, ConfigKey, IlBuffer, Param,
    ParamKey, PortDefinition, PortDirection, PortRange, VideoPortFormat,
};
use super::{IlComponent, IlCore, IlError, IlResult};
use crate::config::MirrorMode;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// An operation recorded by a mock component.
#[derive(Debug, Clone, PartialEq)]
pub enum MockAction {
    /// Component handed out by the core.
    Created,
    /// Ports discovered.
    PortsAdded,
    /// State transition requested.
    SetState(ComponentState),
    /// Port enabled or disabled.
    PortEnabled {
        /// Port index.
        port: u32,
        /// New value.
        enabled: bool,
    },
    /// Port flushing toggled.
    PortFlushing {
        /// Port index.
        port: u32,
        /// New value.
        flushing: bool,
    },
    /// Buffers allocated.
    Allocated(u32),
    /// Buffers freed.
    Deallocated(u32),
    /// Buffers handed to the component.
    Populated(u32),
    /// Reconfiguration flag cleared.
    Reconfigured(u32),
    /// Buffer returned.
    Released {
        /// Port index.
        port: u32,
        /// Buffer id.
        id: u32,
    },
    /// Parameter written.
    SetParameter(Param),
    /// Config written.
    SetConfig(Config),
    /// Tunnel established.
    Tunnel {
        /// Output port on this component.
        out_port: u32,
        /// Destination component.
        dest: String,
        /// Destination port.
        dest_port: u32,
    },
}

/// One journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MockEvent {
    /// Name of the component that recorded the action.
    pub component: String,
    /// The action.
    pub action: MockAction,
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    /// [`IlComponent::add_all_ports`].
    AddPorts,
    /// [`IlComponent::set_state`].
    SetState,
    /// [`IlComponent::set_port_enabled`] and [`IlComponent::set_all_ports_enabled`].
    EnablePort,
    /// [`IlComponent::set_port_flushing`].
    Flush,
    /// [`IlComponent::allocate_buffers`].
    Allocate,
    /// [`IlComponent::deallocate_buffers`].
    Deallocate,
    /// [`IlComponent::populate_port`].
    Populate,
    /// [`IlComponent::release_buffer`].
    Release,
    /// [`IlComponent::get_parameter`].
    GetParameter,
    /// [`IlComponent::set_parameter`].
    SetParameter,
    /// [`IlComponent::get_config`].
    GetConfig,
    /// [`IlComponent::set_config`].
    SetConfig,
    /// [`IlComponent::setup_tunnel`].
    Tunnel,
}

type Journal = Arc<Mutex<Vec<MockEvent>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// MockCore
// ============================================================================

/// Registry of mock components.
#[derive(Default)]
pub struct MockCore {
    components: Mutex<HashMap<String, Arc<MockComponent>>>,
    journal: Journal,
}

impl MockCore {
    /// Create an empty core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component with the given ports.
    pub fn add_component(&self, name: &str, ports: &[(u32, PortDirection)]) -> Arc<MockComponent> {
        let component = Arc::new(MockComponent::new(name, ports, Arc::clone(&self.journal)));
        lock(&self.components).insert(name.to_string(), Arc::clone(&component));
        component
    }

    /// Look up a registered component.
    pub fn component(&self, name: &str) -> Option<Arc<MockComponent>> {
        lock(&self.components).get(name).cloned()
    }

    /// Snapshot of the journal.
    pub fn journal(&self) -> Vec<MockEvent> {
        lock(&self.journal).clone()
    }

    /// Journal actions recorded by `component`.
    pub fn actions_of(&self, component: &str) -> Vec<MockAction> {
        lock(&self.journal)
            .iter()
            .filter(|e| e.component == component)
            .map(|e| e.action.clone())
            .collect()
    }

    /// Empty the journal.
    pub fn clear_journal(&self) {
        lock(&self.journal).clear();
    }
}

impl IlCore for MockCore {
    fn create_component(
        &self,
        _core_name: &str,
        component_name: &str,
        _role: Option<&str>,
    ) -> IlResult<Arc<dyn IlComponent>> {
        let component = self
            .component(component_name)
            .ok_or_else(|| IlError::ComponentNotFound(component_name.to_string()))?;
        component.record(MockAction::Created);
        Ok(component)
    }
}

// ============================================================================
// MockComponent
// ============================================================================

struct MockPort {
    definition: PortDefinition,
    flushing: bool,
    allocated: bool,
    populated: bool,
    reconfigure: bool,
    eos: bool,
    error: bool,
    queue: VecDeque<IlBuffer>,
    released: Vec<u32>,
    formats: Vec<VideoPortFormat>,
    probe_error: Option<IlError>,
    forced_slice_height: Option<u32>,
}

impl MockPort {
    fn new(index: u32, direction: PortDirection) -> Self {
        Self {
            definition: PortDefinition::new(index, direction),
            flushing: false,
            allocated: false,
            populated: false,
            reconfigure: false,
            eos: false,
            error: false,
            queue: VecDeque::new(),
            released: Vec::new(),
            formats: Vec::new(),
            probe_error: None,
            forced_slice_height: None,
        }
    }
}

struct MockState {
    state: ComponentState,
    stalled: bool,
    ports_added: bool,
    ports: HashMap<u32, MockPort>,
    params: HashMap<ParamKey, Param>,
    configs: HashMap<ConfigKey, Config>,
    failures: HashMap<MockOp, IlError>,
}

/// An in-memory component.
pub struct MockComponent {
    name: String,
    inner: Mutex<MockState>,
    changed: Condvar,
    journal: Journal,
}

impl MockComponent {
    fn new(name: &str, ports: &[(u32, PortDirection)], journal: Journal) -> Self {
        Self {
            name: name.to_string(),
            inner: Mutex::new(MockState {
                state: ComponentState::Loaded,
                stalled: false,
                ports_added: false,
                ports: ports
                    .iter()
                    .map(|&(index, dir)| (index, MockPort::new(index, dir)))
                    .collect(),
                params: HashMap::new(),
                configs: HashMap::new(),
                failures: HashMap::new(),
            }),
            changed: Condvar::new(),
            journal,
        }
    }

    fn record(&self, action: MockAction) {
        lock(&self.journal).push(MockEvent {
            component: self.name.clone(),
            action,
        });
    }

    fn check(state: &MockState, op: MockOp) -> IlResult<()> {
        match state.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn with_port<R>(
        &self,
        op: MockOp,
        port: u32,
        f: impl FnOnce(&mut MockPort) -> R,
    ) -> IlResult<R> {
        let mut state = lock(&self.inner);
        Self::check(&state, op)?;
        let port_state = state
            .ports
            .get_mut(&port)
            .ok_or(IlError::BadPortIndex(port))?;
        let out = f(port_state);
        drop(state);
        self.changed.notify_all();
        Ok(out)
    }

    // --- test controls ---

    /// Make `op` fail with `err` until cleared.
    pub fn inject_failure(&self, op: MockOp, err: IlError) {
        lock(&self.inner).failures.insert(op, err);
    }

    /// Stop failing `op`.
    pub fn clear_failure(&self, op: MockOp) {
        lock(&self.inner).failures.remove(&op);
    }

    /// When stalled, requested state transitions never complete.
    pub fn stall_state_changes(&self, stalled: bool) {
        lock(&self.inner).stalled = stalled;
    }

    /// Force the component into `state`.
    pub fn force_state(&self, state: ComponentState) {
        lock(&self.inner).state = state;
        self.changed.notify_all();
    }

    /// Set the formats enumerated on `port`.
    pub fn set_port_formats(&self, port: u32, formats: &[(CompressionFormat, ColorFormat)]) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&port) {
            p.formats = formats
                .iter()
                .enumerate()
                .map(|(index, &(compression, color))| VideoPortFormat {
                    port,
                    index: index as u32,
                    compression,
                    color,
                })
                .collect();
        }
    }

    /// Make format enumeration on `port` fail with `err`.
    pub fn set_probe_error(&self, port: u32, err: Option<IlError>) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&port) {
            p.probe_error = err;
        }
    }

    /// Replace the definition of a port without journaling.
    pub fn seed_definition(&self, def: PortDefinition) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&def.port) {
            p.definition = def;
        }
    }

    /// Slice height reported after every definition write on `port`.
    pub fn force_slice_height(&self, port: u32, slice_height: Option<u32>) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&port) {
            p.forced_slice_height = slice_height;
        }
    }

    /// Report the video port range of the component.
    pub fn set_video_init(&self, start: u32, count: u32) {
        lock(&self.inner)
            .params
            .insert(ParamKey::VideoInit, Param::VideoInit(PortRange { count, start }));
    }

    /// Queue a filled buffer on an output port.
    pub fn push_fragment(&self, port: u32, buffer: IlBuffer) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&port) {
            p.queue.push_back(buffer);
        }
        self.changed.notify_all();
    }

    /// Signal end of stream on `port` once its queue drains.
    pub fn signal_eos(&self, port: u32) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&port) {
            p.eos = true;
        }
        self.changed.notify_all();
    }

    /// Signal a component error on `port`.
    pub fn signal_error(&self, port: u32) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&port) {
            p.error = true;
        }
        self.changed.notify_all();
    }

    /// Request reconfiguration of `port`.
    pub fn request_reconfigure(&self, port: u32) {
        if let Some(p) = lock(&self.inner).ports.get_mut(&port) {
            p.reconfigure = true;
        }
        self.changed.notify_all();
    }

    // --- inspection ---

    /// Current definition of `port`.
    pub fn definition(&self, port: u32) -> Option<PortDefinition> {
        lock(&self.inner).ports.get(&port).map(|p| p.definition)
    }

    /// Stored config, if any.
    pub fn config(&self, key: ConfigKey) -> Option<Config> {
        lock(&self.inner).configs.get(&key).copied()
    }

    /// Stored parameter, if any.
    pub fn parameter(&self, key: ParamKey) -> Option<Param> {
        lock(&self.inner).params.get(&key).copied()
    }

    /// Whether `port` is enabled.
    pub fn is_port_enabled(&self, port: u32) -> bool {
        lock(&self.inner)
            .ports
            .get(&port)
            .is_some_and(|p| p.definition.enabled)
    }

    /// Whether `port` is flushing.
    pub fn is_port_flushing(&self, port: u32) -> bool {
        lock(&self.inner).ports.get(&port).is_some_and(|p| p.flushing)
    }

    /// Whether `port` has buffers allocated.
    pub fn is_allocated(&self, port: u32) -> bool {
        lock(&self.inner).ports.get(&port).is_some_and(|p| p.allocated)
    }

    /// Whether `port` was populated since its last allocation.
    pub fn is_populated(&self, port: u32) -> bool {
        lock(&self.inner).ports.get(&port).is_some_and(|p| p.populated)
    }

    /// Ids of the buffers released on `port`, in order.
    pub fn released(&self, port: u32) -> Vec<u32> {
        lock(&self.inner)
            .ports
            .get(&port)
            .map(|p| p.released.clone())
            .unwrap_or_default()
    }

    /// Number of queued fragments on `port`.
    pub fn queued(&self, port: u32) -> usize {
        lock(&self.inner).ports.get(&port).map_or(0, |p| p.queue.len())
    }
}

impl IlComponent for MockComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_state(&self) -> ComponentState {
        lock(&self.inner).state
    }

    fn set_state(&self, target: ComponentState) -> IlResult<()> {
        {
            let mut state = lock(&self.inner);
            Self::check(&state, MockOp::SetState)?;
            if !state.stalled {
                state.state = target;
            }
        }
        self.record(MockAction::SetState(target));
        self.changed.notify_all();
        Ok(())
    }

    fn wait_for_state(&self, target: ComponentState, timeout: Duration) -> IlResult<()> {
        let deadline = Instant::now() + timeout;
        let mut state = lock(&self.inner);
        while state.state != target {
            let now = Instant::now();
            if now >= deadline {
                return Err(IlError::Timeout);
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Ok(())
    }

    fn add_all_ports(&self) -> IlResult<()> {
        {
            let mut state = lock(&self.inner);
            Self::check(&state, MockOp::AddPorts)?;
            state.ports_added = true;
        }
        self.record(MockAction::PortsAdded);
        Ok(())
    }

    fn has_port(&self, port: u32) -> bool {
        let state = lock(&self.inner);
        state.ports_added && state.ports.contains_key(&port)
    }

    fn set_all_ports_enabled(&self, enabled: bool) -> IlResult<()> {
        let indices: Vec<u32> = {
            let mut state = lock(&self.inner);
            Self::check(&state, MockOp::EnablePort)?;
            let mut indices: Vec<u32> = state.ports.keys().copied().collect();
            indices.sort_unstable();
            for p in state.ports.values_mut() {
                p.definition.enabled = enabled;
            }
            indices
        };
        for port in indices {
            self.record(MockAction::PortEnabled { port, enabled });
        }
        self.changed.notify_all();
        Ok(())
    }

    fn set_port_enabled(&self, port: u32, enabled: bool) -> IlResult<()> {
        self.with_port(MockOp::EnablePort, port, |p| p.definition.enabled = enabled)?;
        self.record(MockAction::PortEnabled { port, enabled });
        Ok(())
    }

    fn set_port_flushing(&self, port: u32, flushing: bool) -> IlResult<()> {
        self.with_port(MockOp::Flush, port, |p| {
            p.flushing = flushing;
            if flushing {
                p.queue.clear();
            }
        })?;
        self.record(MockAction::PortFlushing { port, flushing });
        Ok(())
    }

    fn allocate_buffers(&self, port: u32) -> IlResult<()> {
        self.with_port(MockOp::Allocate, port, |p| {
            p.allocated = true;
            p.populated = false;
        })?;
        self.record(MockAction::Allocated(port));
        Ok(())
    }

    fn deallocate_buffers(&self, port: u32) -> IlResult<()> {
        self.with_port(MockOp::Deallocate, port, |p| {
            p.allocated = false;
            p.populated = false;
        })?;
        self.record(MockAction::Deallocated(port));
        Ok(())
    }

    fn populate_port(&self, port: u32) -> IlResult<()> {
        self.with_port(MockOp::Populate, port, |p| p.populated = true)?;
        self.record(MockAction::Populated(port));
        Ok(())
    }

    fn mark_reconfigured(&self, port: u32) -> IlResult<()> {
        let mut state = lock(&self.inner);
        let p = state.ports.get_mut(&port).ok_or(IlError::BadPortIndex(port))?;
        p.reconfigure = false;
        drop(state);
        self.record(MockAction::Reconfigured(port));
        Ok(())
    }

    fn acquire_buffer(&self, port: u32) -> Acquire {
        let mut state = lock(&self.inner);
        loop {
            let Some(p) = state.ports.get_mut(&port) else {
                return Acquire::Error;
            };
            if p.error {
                return Acquire::Error;
            }
            if p.flushing {
                return Acquire::Flushing;
            }
            if p.reconfigure {
                return Acquire::Reconfigure;
            }
            if let Some(buffer) = p.queue.pop_front() {
                return Acquire::Buffer(buffer);
            }
            if p.eos {
                return Acquire::Eos;
            }
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn release_buffer(&self, port: u32, buffer: IlBuffer) -> IlResult<()> {
        let id = buffer.id;
        self.with_port(MockOp::Release, port, |p| p.released.push(id))?;
        self.record(MockAction::Released { port, id });
        Ok(())
    }

    fn get_parameter(&self, key: ParamKey) -> IlResult<Param> {
        let state = lock(&self.inner);
        Self::check(&state, MockOp::GetParameter)?;
        match key {
            ParamKey::PortDefinition { port } => state
                .ports
                .get(&port)
                .map(|p| Param::PortDefinition(p.definition))
                .ok_or(IlError::BadPortIndex(port)),
            ParamKey::VideoPortFormat { port, index } => {
                let p = state.ports.get(&port).ok_or(IlError::BadPortIndex(port))?;
                if let Some(err) = &p.probe_error {
                    return Err(err.clone());
                }
                p.formats
                    .get(index as usize)
                    .map(|f| Param::VideoPortFormat(*f))
                    .ok_or(IlError::NoMore)
            }
            other => state
                .params
                .get(&other)
                .copied()
                .ok_or(IlError::UnsupportedIndex),
        }
    }

    fn set_parameter(&self, param: Param) -> IlResult<()> {
        {
            let mut state = lock(&self.inner);
            Self::check(&state, MockOp::SetParameter)?;
            match param {
                Param::PortDefinition(mut def) => {
                    let p = state
                        .ports
                        .get_mut(&def.port)
                        .ok_or(IlError::BadPortIndex(def.port))?;
                    if let Some(slice) = p.forced_slice_height {
                        def.video.slice_height = slice;
                    }
                    def.direction = p.definition.direction;
                    p.definition = def;
                }
                other => {
                    state.params.insert(other.key(), other);
                }
            }
        }
        self.record(MockAction::SetParameter(param));
        Ok(())
    }

    fn get_config(&self, key: ConfigKey) -> IlResult<Config> {
        let state = lock(&self.inner);
        Self::check(&state, MockOp::GetConfig)?;
        if let Some(config) = state.configs.get(&key) {
            return Ok(*config);
        }
        // Port-scoped configs exist on every port with their reset value.
        match key {
            ConfigKey::FrameRate { port }
            | ConfigKey::Capturing { port }
            | ConfigKey::Mirror { port }
                if !state.ports.contains_key(&port) =>
            {
                Err(IlError::BadPortIndex(port))
            }
            ConfigKey::FrameRate { port } => Ok(Config::FrameRate { port, q16: 0 }),
            ConfigKey::Capturing { port } => Ok(Config::Capturing {
                port,
                enabled: false,
            }),
            ConfigKey::Mirror { port } => Ok(Config::Mirror {
                port,
                mode: MirrorMode::None,
            }),
            _ => Err(IlError::UnsupportedIndex),
        }
    }

    fn set_config(&self, config: Config) -> IlResult<()> {
        {
            let mut state = lock(&self.inner);
            Self::check(&state, MockOp::SetConfig)?;
            state.configs.insert(config.key(), config);
        }
        self.record(MockAction::SetConfig(config));
        self.changed.notify_all();
        Ok(())
    }

    fn setup_tunnel(
        &self,
        out_port: u32,
        dest: &dyn IlComponent,
        dest_port: u32,
    ) -> IlResult<()> {
        {
            let state = lock(&self.inner);
            Self::check(&state, MockOp::Tunnel)?;
            if !state.ports.contains_key(&out_port) {
                return Err(IlError::BadPortIndex(out_port));
            }
        }
        if !dest.has_port(dest_port) {
            return Err(IlError::PortsNotCompatible);
        }
        self.record(MockAction::Tunnel {
            out_port,
            dest: dest.name().to_string(),
            dest_port,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::il::IlBufferFlags;
    use std::thread;

    fn camera(core: &MockCore) -> Arc<MockComponent> {
        core.add_component(
            "cam",
            &[(0, PortDirection::Input), (1, PortDirection::Output)],
        )
    }

    #[test]
    fn test_unknown_component_not_found() {
        let core = MockCore::new();
        let err = core.create_component("c", "missing", None).err();
        assert_eq!(err, Some(IlError::ComponentNotFound("missing".into())));
    }

    #[test]
    fn test_ports_hidden_until_added() {
        let core = MockCore::new();
        let cam = camera(&core);
        assert!(!cam.has_port(1));
        cam.add_all_ports().unwrap();
        assert!(cam.has_port(1));
        assert!(!cam.has_port(7));
    }

    #[test]
    fn test_state_wait_and_stall() {
        let core = MockCore::new();
        let cam = camera(&core);
        cam.set_state(ComponentState::Idle).unwrap();
        cam.wait_for_state(ComponentState::Idle, Duration::from_millis(10))
            .unwrap();

        cam.stall_state_changes(true);
        cam.set_state(ComponentState::Executing).unwrap();
        assert_eq!(
            cam.wait_for_state(ComponentState::Executing, Duration::from_millis(10)),
            Err(IlError::Timeout)
        );
    }

    #[test]
    fn test_format_enumeration_ends_with_no_more() {
        let core = MockCore::new();
        let cam = camera(&core);
        cam.set_port_formats(1, &[(CompressionFormat::Unused, ColorFormat::Yuv420PackedPlanar)]);
        assert!(cam.get_parameter(ParamKey::VideoPortFormat { port: 1, index: 0 }).is_ok());
        assert_eq!(
            cam.get_parameter(ParamKey::VideoPortFormat { port: 1, index: 1 }),
            Err(IlError::NoMore)
        );
    }

    #[test]
    fn test_acquire_blocks_until_fragment() {
        let core = MockCore::new();
        let cam = camera(&core);
        let producer = Arc::clone(&cam);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.push_fragment(1, IlBuffer::new(7, vec![1u8; 4], IlBufferFlags::ENDOFFRAME));
        });
        match cam.acquire_buffer(1) {
            Acquire::Buffer(buf) => assert_eq!(buf.id, 7),
            other => panic!("unexpected {other:?}"),
        }
        handle.join().unwrap();
    }

    #[test]
    fn test_flushing_interrupts_acquire() {
        let core = MockCore::new();
        let cam = camera(&core);
        cam.push_fragment(1, IlBuffer::new(0, vec![0u8; 4], IlBufferFlags::NONE));
        cam.set_port_flushing(1, true).unwrap();
        assert!(matches!(cam.acquire_buffer(1), Acquire::Flushing));
        assert_eq!(cam.queued(1), 0);
    }

    #[test]
    fn test_injected_failure() {
        let core = MockCore::new();
        let cam = camera(&core);
        cam.inject_failure(MockOp::Allocate, IlError::InsufficientResources);
        assert_eq!(cam.allocate_buffers(1), Err(IlError::InsufficientResources));
        cam.clear_failure(MockOp::Allocate);
        assert!(cam.allocate_buffers(1).is_ok());
    }

    #[test]
    fn test_journal_records_across_components() {
        let core = MockCore::new();
        let cam = camera(&core);
        let sink = core.add_component("sink", &[(0, PortDirection::Input)]);
        sink.add_all_ports().unwrap();
        cam.setup_tunnel(1, sink.as_ref(), 0).unwrap();
        sink.set_state(ComponentState::Idle).unwrap();

        let journal = core.journal();
        assert_eq!(journal.len(), 3);
        assert_eq!(journal[1].component, "cam");
        assert_eq!(
            core.actions_of("sink").last(),
            Some(&MockAction::SetState(ComponentState::Idle))
        );
    }

    #[test]
    fn test_port_configs_have_defaults() {
        let core = MockCore::new();
        let cam = camera(&core);
        assert_eq!(
            cam.get_config(ConfigKey::Capturing { port: 1 }),
            Ok(Config::Capturing {
                port: 1,
                enabled: false
            })
        );
        assert_eq!(
            cam.get_config(ConfigKey::Capturing { port: 9 }),
            Err(IlError::BadPortIndex(9))
        );
        assert_eq!(cam.get_config(ConfigKey::Gamma), Err(IlError::UnsupportedIndex));
    }
}
