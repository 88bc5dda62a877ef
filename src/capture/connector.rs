//! Connector enumeration and output selection.
//!
//! One pass over the device's connectors produces both the diagnostic
//! trace and the candidate list used for selection, so discovery and
//! selection cannot disagree about what the device reported.

use drm::control::{connector, Device as ControlDevice};
use serde::Serialize;
use tracing::{debug, warn};

use super::device::Card;
use super::error::CaptureError;

/// A supported resolution of an output.
#[derive(Debug, Clone, Serialize)]
pub struct ModeInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub refresh_hz: u32,
}

/// One physical display connector as reported by the device.
#[derive(Debug, Clone, Serialize)]
pub struct OutputInfo {
    /// Connector name, e.g. `HDMIA-1`
    pub name: String,
    pub connected: bool,
    pub modes: Vec<ModeInfo>,
}

impl OutputInfo {
    fn from_drm(info: &connector::Info) -> Self {
        let name = format!("{:?}-{}", info.interface(), info.interface_id());
        let connected = matches!(info.state(), connector::State::Connected);
        let modes = info
            .modes()
            .iter()
            .map(|mode| {
                let (width, height) = mode.size();
                ModeInfo {
                    name: mode.name().to_string_lossy().into_owned(),
                    width: u32::from(width),
                    height: u32::from(height),
                    refresh_hz: mode.vrefresh(),
                }
            })
            .collect();
        Self {
            name,
            connected,
            modes,
        }
    }
}

/// Enumerate all connectors on the device.
///
/// A failed query for an individual connector is logged and skipped;
/// only the resource query itself is fatal.
pub fn list_outputs(card: &Card) -> Result<Vec<OutputInfo>, CaptureError> {
    let resources = card
        .resource_handles()
        .map_err(|source| CaptureError::Resources { source })?;

    let mut outputs = Vec::with_capacity(resources.connectors().len());
    for &handle in resources.connectors() {
        match card.get_connector(handle, false) {
            Ok(info) => {
                let output = OutputInfo::from_drm(&info);
                debug!(
                    "connector {}: {}, {} mode(s)",
                    output.name,
                    if output.connected {
                        "connected"
                    } else {
                        "disconnected"
                    },
                    output.modes.len()
                );
                outputs.push(output);
            }
            Err(err) => warn!("skipping connector {:?}: {}", handle, err),
        }
    }
    Ok(outputs)
}

/// Pick the output to capture.
///
/// Without an override this is the first connected connector with a
/// non-empty mode list, in enumeration order.  With an override, the
/// named connector must exist and be active.
pub fn select_output<'a>(
    outputs: &'a [OutputInfo],
    wanted: Option<&str>,
) -> Result<&'a OutputInfo, CaptureError> {
    match wanted {
        Some(name) => outputs
            .iter()
            .find(|o| o.name == name && o.connected && !o.modes.is_empty())
            .ok_or_else(|| CaptureError::ConnectorNotFound {
                name: name.to_owned(),
            }),
        None => outputs
            .iter()
            .find(|o| o.connected && !o.modes.is_empty())
            .ok_or(CaptureError::NoActiveConnector),
    }
}

/// Pick the mode to size the capture buffer to.
///
/// First mode in the list.  Usually that is the display's preferred
/// mode, but nothing guarantees it; treat it as a default, not "best".
pub fn choose_mode(output: &OutputInfo) -> Option<&ModeInfo> {
    output.modes.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(name: &str, connected: bool, modes: &[(u32, u32)]) -> OutputInfo {
        OutputInfo {
            name: name.to_owned(),
            connected,
            modes: modes
                .iter()
                .map(|&(width, height)| ModeInfo {
                    name: format!("{}x{}", width, height),
                    width,
                    height,
                    refresh_hz: 60,
                })
                .collect(),
        }
    }

    #[test]
    fn selects_first_connected_with_modes() {
        let outputs = vec![
            output("VGA-1", false, &[(640, 480)]),
            output("HDMIA-1", true, &[]),
            output("DisplayPort-1", true, &[(1920, 1080), (1280, 720)]),
            output("DisplayPort-2", true, &[(2560, 1440)]),
        ];
        let selected = select_output(&outputs, None).unwrap();
        assert_eq!(selected.name, "DisplayPort-1");
    }

    #[test]
    fn connected_without_modes_is_not_eligible() {
        let outputs = vec![output("HDMIA-1", true, &[])];
        let err = select_output(&outputs, None).unwrap_err();
        assert!(matches!(err, CaptureError::NoActiveConnector));
    }

    #[test]
    fn no_connectors_at_all_fails() {
        let err = select_output(&[], None).unwrap_err();
        assert!(matches!(err, CaptureError::NoActiveConnector));
    }

    #[test]
    fn override_selects_by_name() {
        let outputs = vec![
            output("DisplayPort-1", true, &[(1920, 1080)]),
            output("HDMIA-1", true, &[(3840, 2160)]),
        ];
        let selected = select_output(&outputs, Some("HDMIA-1")).unwrap();
        assert_eq!(selected.name, "HDMIA-1");
    }

    #[test]
    fn override_unknown_name_fails() {
        let outputs = vec![output("DisplayPort-1", true, &[(1920, 1080)])];
        let err = select_output(&outputs, Some("HDMIA-9")).unwrap_err();
        match err {
            CaptureError::ConnectorNotFound { name } => assert_eq!(name, "HDMIA-9"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn override_disconnected_connector_fails() {
        let outputs = vec![output("HDMIA-1", false, &[(1920, 1080)])];
        let err = select_output(&outputs, Some("HDMIA-1")).unwrap_err();
        assert!(matches!(err, CaptureError::ConnectorNotFound { .. }));
    }

    #[test]
    fn first_mode_wins() {
        let out = output("DisplayPort-1", true, &[(1280, 1024), (1920, 1080)]);
        let mode = choose_mode(&out).unwrap();
        assert_eq!((mode.width, mode.height), (1280, 1024));
    }

    #[test]
    fn no_mode_for_empty_list() {
        let out = output("DisplayPort-1", true, &[]);
        assert!(choose_mode(&out).is_none());
    }
}
