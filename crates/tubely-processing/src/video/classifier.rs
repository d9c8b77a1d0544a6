use tubely_core::Orientation;

use crate::metadata::ProbeResult;

const LANDSCAPE_BAND: (f64, f64) = (1.7, 1.8);
const PORTRAIT_BAND: (f64, f64) = (0.55, 0.6);

/// Orientation from aspect ratio, using open intervals around 16:9 and 9:16.
pub fn classify(probe: &ProbeResult) -> Orientation {
    let Some(ratio) = probe.aspect_ratio() else {
        return Orientation::Other;
    };

    if ratio > LANDSCAPE_BAND.0 && ratio < LANDSCAPE_BAND.1 {
        Orientation::Landscape
    } else if ratio > PORTRAIT_BAND.0 && ratio < PORTRAIT_BAND.1 {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}
