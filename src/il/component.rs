//! Component traits and port handles.

use super::types::{
    Acquire, ComponentState, Config, ConfigKey, IlBuffer, Param, ParamKey, PortDefinition,
};
use super::{IlError, IlResult};
use std::sync::Arc;
use std::time::Duration;

/// Factory for hardware components.
pub trait IlCore: Send + Sync {
    /// Create component `component_name` from the library `core_name`.
    ///
    /// `role` selects a role on components that implement several.
    fn create_component(
        &self,
        core_name: &str,
        component_name: &str,
        role: Option<&str>,
    ) -> IlResult<Arc<dyn IlComponent>>;
}

/// A hardware component.
///
/// All methods take `&self`: implementations synchronize internally, so a
/// component can be shared between the control path and the streaming
/// thread.
pub trait IlComponent: Send + Sync {
    /// Component name, for logging.
    fn name(&self) -> &str;

    // --- state ---

    /// Current state.
    fn get_state(&self) -> ComponentState;

    /// Request a state transition. Completion is observed with
    /// [`wait_for_state`](Self::wait_for_state).
    fn set_state(&self, state: ComponentState) -> IlResult<()>;

    /// Block until the component reaches `state`.
    ///
    /// Fails with [`IlError::Timeout`] when `timeout` elapses first.
    fn wait_for_state(&self, state: ComponentState, timeout: Duration) -> IlResult<()>;

    // --- ports ---

    /// Discover every port of the component.
    fn add_all_ports(&self) -> IlResult<()>;

    /// Check if `port` was discovered.
    fn has_port(&self, port: u32) -> bool;

    /// Enable or disable every port.
    fn set_all_ports_enabled(&self, enabled: bool) -> IlResult<()>;

    /// Enable or disable one port.
    fn set_port_enabled(&self, port: u32, enabled: bool) -> IlResult<()>;

    /// Enter or leave flushing on one port.
    fn set_port_flushing(&self, port: u32, flushing: bool) -> IlResult<()>;

    /// Allocate the buffers of a port.
    fn allocate_buffers(&self, port: u32) -> IlResult<()>;

    /// Free the buffers of a port.
    fn deallocate_buffers(&self, port: u32) -> IlResult<()>;

    /// Hand all buffers of an output port to the component.
    fn populate_port(&self, port: u32) -> IlResult<()>;

    /// Clear the pending-reconfiguration flag of a port.
    fn mark_reconfigured(&self, port: u32) -> IlResult<()>;

    /// Block until an output port has a filled buffer or changes condition.
    fn acquire_buffer(&self, port: u32) -> Acquire;

    /// Return a buffer to the component.
    fn release_buffer(&self, port: u32, buffer: IlBuffer) -> IlResult<()>;

    // --- parameters and configs ---

    /// Read a parameter.
    fn get_parameter(&self, key: ParamKey) -> IlResult<Param>;

    /// Write a parameter.
    fn set_parameter(&self, param: Param) -> IlResult<()>;

    /// Read a config.
    fn get_config(&self, key: ConfigKey) -> IlResult<Config>;

    /// Write a config.
    fn set_config(&self, config: Config) -> IlResult<()>;

    /// Connect output `out_port` to `dest_port` of `dest`.
    fn setup_tunnel(&self, out_port: u32, dest: &dyn IlComponent, dest_port: u32)
    -> IlResult<()>;

    // --- provided ---

    /// Read the definition of `port`.
    fn port_definition(&self, port: u32) -> IlResult<PortDefinition> {
        match self.get_parameter(ParamKey::PortDefinition { port })? {
            Param::PortDefinition(def) => Ok(def),
            _ => Err(IlError::BadParameter),
        }
    }

    /// Write a port definition.
    fn set_port_definition(&self, def: PortDefinition) -> IlResult<()> {
        self.set_parameter(Param::PortDefinition(def))
    }
}

/// One port of a component.
#[derive(Clone)]
pub struct PortHandle {
    component: Arc<dyn IlComponent>,
    index: u32,
}

impl PortHandle {
    /// Refer to port `index` of `component`.
    pub fn new(component: Arc<dyn IlComponent>, index: u32) -> Self {
        Self { component, index }
    }

    /// Port index.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Owning component.
    #[inline]
    pub fn component(&self) -> &Arc<dyn IlComponent> {
        &self.component
    }

    /// Enable or disable the port.
    pub fn set_enabled(&self, enabled: bool) -> IlResult<()> {
        self.component.set_port_enabled(self.index, enabled)
    }

    /// Enter or leave flushing.
    pub fn set_flushing(&self, flushing: bool) -> IlResult<()> {
        self.component.set_port_flushing(self.index, flushing)
    }

    /// Allocate buffers.
    pub fn allocate_buffers(&self) -> IlResult<()> {
        self.component.allocate_buffers(self.index)
    }

    /// Free buffers.
    pub fn deallocate_buffers(&self) -> IlResult<()> {
        self.component.deallocate_buffers(self.index)
    }

    /// Hand buffers to the component.
    pub fn populate(&self) -> IlResult<()> {
        self.component.populate_port(self.index)
    }

    /// Clear the pending-reconfiguration flag.
    pub fn mark_reconfigured(&self) -> IlResult<()> {
        self.component.mark_reconfigured(self.index)
    }

    /// Wait for the next buffer.
    pub fn acquire(&self) -> Acquire {
        self.component.acquire_buffer(self.index)
    }

    /// Return a buffer.
    pub fn release(&self, buffer: IlBuffer) -> IlResult<()> {
        self.component.release_buffer(self.index, buffer)
    }

    /// Read the port definition.
    pub fn definition(&self) -> IlResult<PortDefinition> {
        self.component.port_definition(self.index)
    }

    /// Write the port definition.
    pub fn set_definition(&self, def: PortDefinition) -> IlResult<()> {
        self.component.set_port_definition(def)
    }

    /// Tunnel this port into `dest`.
    pub fn tunnel_to(&self, dest: &PortHandle) -> IlResult<()> {
        self.component
            .setup_tunnel(self.index, dest.component.as_ref(), dest.index)
    }
}

impl std::fmt::Debug for PortHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortHandle")
            .field("component", &self.component.name())
            .field("index", &self.index)
            .finish()
    }
}
