//! Opening, configuring and closing the hardware components.

use super::live::{Live, LiveState, Timing};
use super::negotiation::Negotiation;
use crate::config::{ENCODER_COMPONENT, NULL_SINK_COMPONENT};
use crate::error::{Error, Result};
use crate::il::{
    ComponentRole, ComponentState, Config, IlComponent, IlCore, IlError, Param, ParamKey,
    PortHandle, PortRange, PortRole,
};
use std::sync::Arc;
use std::time::Duration;

/// Bound on every awaited component state transition.
pub const STATE_TIMEOUT: Duration = Duration::from_secs(1);

/// Request `state` and wait for the component to reach it.
pub(crate) fn set_state_and_wait(component: &dyn IlComponent, state: ComponentState) -> Result<()> {
    let timed_out = |source| Error::StateTimeout {
        component: component.name().to_string(),
        state,
        source,
    };
    component.set_state(state).map_err(timed_out)?;
    component
        .wait_for_state(state, STATE_TIMEOUT)
        .map_err(timed_out)
}

/// Walk a component back down to Loaded from wherever it is.
pub(crate) fn drive_to_loaded(component: &dyn IlComponent) -> Result<()> {
    loop {
        match component.get_state() {
            ComponentState::Loaded => return Ok(()),
            ComponentState::Executing => set_state_and_wait(component, ComponentState::Idle)?,
            ComponentState::Idle => set_state_and_wait(component, ComponentState::Loaded)?,
            state => {
                return Err(Error::InvalidState {
                    component: component.name().to_string(),
                    state,
                });
            }
        }
    }
}

fn open_component(
    core: &dyn IlCore,
    core_name: &str,
    name: &str,
    role: Option<&str>,
) -> Result<Arc<dyn IlComponent>> {
    let component = core.create_component(core_name, name, role)?;
    let state = component.get_state();
    if state != ComponentState::Loaded {
        return Err(Error::InvalidState {
            component: name.to_string(),
            state,
        });
    }
    component.add_all_ports()?;
    component.set_all_ports_enabled(false)?;
    tracing::debug!(component = name, "opened component");
    Ok(component)
}

fn video_init(component: &dyn IlComponent) -> Result<PortRange> {
    match component.get_parameter(ParamKey::VideoInit)? {
        Param::VideoInit(range) => Ok(range),
        _ => Err(IlError::BadParameter.into()),
    }
}

fn port(component: &Arc<dyn IlComponent>, role: PortRole, index: u32) -> Result<PortHandle> {
    if !component.has_port(index) {
        tracing::error!(%role, index, "port not found");
        return Err(Error::PortMissing(role));
    }
    Ok(PortHandle::new(Arc::clone(component), index))
}

/// Open the camera and, on the extended target, the null sink and the
/// encoder. Components are stored as soon as they are open so that a failed
/// start can be unwound by `stop`.
fn open(state: &mut LiveState, core: &dyn IlCore) -> Result<()> {
    let cfg = state.component.clone();

    let camera = open_component(
        core,
        &cfg.core_name,
        &cfg.component_name,
        cfg.component_role.as_deref(),
    )?;
    state.components[ComponentRole::Camera.index()] = Some(Arc::clone(&camera));
    state.ports[PortRole::CameraIn.index()] =
        Some(port(&camera, PortRole::CameraIn, cfg.in_port_index)?);
    state.ports[PortRole::CameraVideoOut.index()] =
        Some(port(&camera, PortRole::CameraVideoOut, cfg.out_port_index)?);

    if !state.target.is_extended() {
        return Ok(());
    }

    // The preview output sits right below the video output.
    let preview_index = cfg
        .out_port_index
        .checked_sub(1)
        .ok_or(Error::PortMissing(PortRole::CameraPreviewOut))?;
    state.ports[PortRole::CameraPreviewOut.index()] =
        Some(port(&camera, PortRole::CameraPreviewOut, preview_index)?);

    let null_sink = open_component(core, &cfg.core_name, NULL_SINK_COMPONENT, None)?;
    state.components[ComponentRole::NullSink.index()] = Some(Arc::clone(&null_sink));
    let range = video_init(null_sink.as_ref())?;
    state.ports[PortRole::NullSinkIn.index()] =
        Some(port(&null_sink, PortRole::NullSinkIn, range.start)?);

    let encoder = open_component(core, &cfg.core_name, ENCODER_COMPONENT, None)?;
    state.components[ComponentRole::Encoder.index()] = Some(Arc::clone(&encoder));
    let range = video_init(encoder.as_ref())?;
    state.ports[PortRole::EncoderIn.index()] =
        Some(port(&encoder, PortRole::EncoderIn, range.start)?);
    state.ports[PortRole::EncoderOut.index()] =
        Some(port(&encoder, PortRole::EncoderOut, range.start + 1)?);

    Ok(())
}

/// Push every tuning knob to the camera.
fn configure_camera(state: &LiveState) -> Result<()> {
    let camera = state.require_component(ComponentRole::Camera)?;
    let config = &state.config;
    let extended = state.target.is_extended();
    let push = |what: &'static str, value: Config| {
        camera.set_config(value).inspect_err(|err| {
            tracing::error!(error = %err, "error setting {what}");
        })
    };

    camera
        .set_parameter(Param::CameraDeviceNumber(config.device_number()))
        .inspect_err(|err| tracing::error!(error = %err, "error setting camera device number"))?;

    if extended {
        push("sharpness", Config::Sharpness(config.sharpness()))?;
    }
    if let Some(gamma) = config.gamma_q16() {
        push("gamma", Config::Gamma(gamma))?;
    }
    push("contrast", Config::Contrast(config.contrast()))?;
    push("brightness", Config::Brightness(config.brightness()))?;
    push("saturation", Config::Saturation(config.saturation()))?;
    push("image filter", Config::ImageFilter(config.image_filter()))?;

    let enhancement = config.color_enhancement();
    push(
        "color enhancement",
        Config::ColorEnhancement {
            enabled: enhancement.enabled,
            u: enhancement.u,
            v: enhancement.v,
        },
    )?;
    push("white balance", Config::WhiteBalance(config.white_balance()))?;
    push(
        "exposure control",
        Config::ExposureControl(config.exposure_control()),
    )?;
    push("exposure value", Config::ExposureValue(config.exposure()))?;
    push(
        "frame stabilisation",
        Config::FrameStabilisation(config.frame_stabilisation()),
    )?;

    let video_out = state.require_port(PortRole::CameraVideoOut)?;
    push(
        "video mirror",
        Config::Mirror {
            port: video_out.index(),
            mode: config.mirror(),
        },
    )?;
    if extended {
        let preview = state.require_port(PortRole::CameraPreviewOut)?;
        push(
            "preview mirror",
            Config::Mirror {
                port: preview.index(),
                mode: config.mirror(),
            },
        )?;
    }
    Ok(())
}

/// Open and configure the components, then mark the camera configured.
pub(crate) fn start(live: &Live, core: &dyn IlCore) -> Result<()> {
    let mut state = live.lock();
    state.timing = Timing::default();

    let result = open(&mut state, core).and_then(|()| configure_camera(&state));
    match &result {
        Ok(()) => {
            state.camera_configured = true;
            tracing::info!(hardware = ?state.target, "camera opened and configured");
        }
        Err(err) => tracing::error!(error = %err, "failed to start camera"),
    }
    drop(state);
    live.broadcast();
    result
}

/// Return every component to Loaded and forget all handles, cached formats
/// and negotiation results. Teardown errors are logged, never returned.
pub(crate) fn stop(live: &Live) {
    let mut state = live.lock();

    for role in ComponentRole::ALL.into_iter().rev() {
        if let Some(component) = state.component(role) {
            if let Err(err) = drive_to_loaded(component.as_ref()) {
                tracing::error!(component = component.name(), error = %err, "failed to unload component");
            }
        }
    }

    state.ports = Default::default();
    state.components = Default::default();
    state.camera_configured = false;
    state.video_configured = false;
    state.catalog.clear();
    state.negotiation = Negotiation::default();
    tracing::debug!("camera closed");
    drop(state);
    live.broadcast();
}
