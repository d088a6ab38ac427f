//! Ordered bring-up and tear-down of the capture chain.
//!
//! Bring-up: tunnels, Idle, port enable, flushing off, buffer allocation,
//! Executing, capture on, output population. Tear-down walks the same
//! steps backwards. Which components and ports take part depends on the
//! target and on whether the committed format is compressed.

use super::lifecycle::set_state_and_wait;
use super::live::{Live, LiveState};
use crate::error::{Error, Result};
use crate::il::{ComponentRole, ComponentState, Config, IlComponent, PortHandle, PortRole};
use std::sync::Arc;

/// Components and ports involved in capturing the committed format.
struct CapturePlan {
    components: Vec<Arc<dyn IlComponent>>,
    ports: Vec<PortHandle>,
    buffer_ports: Vec<PortHandle>,
    tunnels: Vec<(PortHandle, PortHandle)>,
}

struct PlanRoles {
    components: Vec<ComponentRole>,
    ports: Vec<PortRole>,
    buffer_ports: Vec<PortRole>,
    tunnels: Vec<(PortRole, PortRole)>,
}

impl CapturePlan {
    fn roles(state: &LiveState) -> PlanRoles {
        let extended = state.target.is_extended();
        let chained = extended
            && state
                .negotiation
                .format
                .as_ref()
                .is_some_and(|f| !f.is_raw());

        let mut components = vec![ComponentRole::Camera];
        let mut ports = vec![PortRole::CameraIn, PortRole::CameraVideoOut];
        let mut tunnels = Vec::new();
        if extended {
            components.push(ComponentRole::NullSink);
            ports.extend([PortRole::CameraPreviewOut, PortRole::NullSinkIn]);
            tunnels.push((PortRole::CameraPreviewOut, PortRole::NullSinkIn));
        }
        if chained {
            components.push(ComponentRole::Encoder);
            ports.extend([PortRole::EncoderIn, PortRole::EncoderOut]);
            tunnels.push((PortRole::CameraVideoOut, PortRole::EncoderIn));
        }
        let output = if chained {
            PortRole::EncoderOut
        } else {
            PortRole::CameraVideoOut
        };
        PlanRoles {
            components,
            ports,
            buffer_ports: vec![PortRole::CameraIn, output],
            tunnels,
        }
    }

    /// Every handle must be present.
    fn strict(state: &LiveState) -> Result<Self> {
        let PlanRoles {
            components,
            ports,
            buffer_ports,
            tunnels,
        } = Self::roles(state);
        Ok(Self {
            components: components
                .into_iter()
                .map(|r| state.require_component(r).cloned())
                .collect::<Result<_>>()?,
            ports: ports
                .into_iter()
                .map(|r| state.require_port(r).cloned())
                .collect::<Result<_>>()?,
            buffer_ports: buffer_ports
                .into_iter()
                .map(|r| state.require_port(r).cloned())
                .collect::<Result<_>>()?,
            tunnels: tunnels
                .into_iter()
                .map(|(out, dest)| {
                    Ok((
                        state.require_port(out)?.clone(),
                        state.require_port(dest)?.clone(),
                    ))
                })
                .collect::<Result<_>>()?,
        })
    }

    /// Absent handles are skipped.
    fn lenient(state: &LiveState) -> Self {
        let PlanRoles {
            components,
            ports,
            buffer_ports,
            ..
        } = Self::roles(state);
        Self {
            components: components
                .into_iter()
                .filter_map(|r| state.component(r).cloned())
                .collect(),
            ports: ports
                .into_iter()
                .filter_map(|r| state.port(r).cloned())
                .collect(),
            buffer_ports: buffer_ports
                .into_iter()
                .filter_map(|r| state.port(r).cloned())
                .collect(),
            tunnels: Vec::new(),
        }
    }
}

/// Bring the capture chain to Executing and start capturing.
///
/// Blocks until a format has been committed.
pub(crate) fn start_capturing(live: &Live) -> Result<()> {
    let state = live.lock();
    let state = live.wait_until(state, "video not configured", |s| s.video_configured);

    let result = bring_up(&state);
    if let Err(err) = &result {
        tracing::error!(error = %err, "failed to start capturing");
    }
    drop(state);
    live.broadcast();
    result
}

fn bring_up(state: &LiveState) -> Result<()> {
    let plan = CapturePlan::strict(state)?;
    let camera = state.require_component(ComponentRole::Camera)?;
    let video_out = state.require_port(PortRole::CameraVideoOut)?;

    for (out, dest) in &plan.tunnels {
        out.tunnel_to(dest)?;
    }
    for component in &plan.components {
        set_state_and_wait(component.as_ref(), ComponentState::Idle)?;
    }
    for port in &plan.ports {
        port.set_enabled(true)?;
    }
    for port in &plan.ports {
        port.set_flushing(false)?;
    }
    for port in &plan.buffer_ports {
        port.allocate_buffers()?;
    }
    for component in &plan.components {
        set_state_and_wait(component.as_ref(), ComponentState::Executing)?;
    }

    camera.set_config(Config::Capturing {
        port: video_out.index(),
        enabled: true,
    })?;

    // The last buffer port is the output frames come from.
    let output = plan
        .buffer_ports
        .last()
        .ok_or(Error::PortMissing(PortRole::CameraVideoOut))?;
    output.populate()?;
    output.mark_reconfigured()?;

    tracing::info!(components = plan.components.len(), "capture started");
    Ok(())
}

/// Stop capturing and bring the chain back to Loaded.
///
/// Does nothing when the camera is not executing.
pub(crate) fn stop_capturing(live: &Live) -> Result<()> {
    let state = live.lock();
    let executing = state
        .component(ComponentRole::Camera)
        .is_some_and(|c| c.get_state() == ComponentState::Executing);
    if !executing {
        return Ok(());
    }

    let result = tear_down(&state);
    if let Err(err) = &result {
        tracing::error!(error = %err, "failed to stop capturing");
    }
    drop(state);
    live.broadcast();
    result
}

fn tear_down(state: &LiveState) -> Result<()> {
    let plan = CapturePlan::lenient(state);

    if let (Some(camera), Some(video_out)) = (
        state.component(ComponentRole::Camera),
        state.port(PortRole::CameraVideoOut),
    ) {
        camera.set_config(Config::Capturing {
            port: video_out.index(),
            enabled: false,
        })?;
    }

    for port in &plan.ports {
        port.set_flushing(true)?;
    }
    for port in &plan.ports {
        port.set_enabled(false)?;
    }
    for port in &plan.buffer_ports {
        port.deallocate_buffers()?;
    }
    for component in plan.components.iter().rev() {
        set_state_and_wait(component.as_ref(), ComponentState::Idle)?;
    }
    for component in plan.components.iter().rev() {
        set_state_and_wait(component.as_ref(), ComponentState::Loaded)?;
    }

    tracing::info!("capture stopped");
    Ok(())
}
