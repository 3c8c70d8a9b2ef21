//! Dynamic-range classification.

use crate::probe::{MediaStreamRecord, StreamKind};

use super::error::ClassificationError;
use super::types::VideoClassification;

const HEVC_CODECS: [&str; 4] = ["hevc", "h265", "dvhe", "dvh1"];
const PQ_TRANSFER: &str = "smpte2084";
const HLG_TRANSFER: &str = "arib-std-b67";
const DV_MARKERS: [&str; 2] = ["dovi", "dolby vision"];

/// Whether `codec` names an HEVC-family video codec.
pub fn is_hevc(codec: &str) -> bool {
    HEVC_CODECS.contains(&codec.to_lowercase().as_str())
}

/// Classify the single video stream of a file.
///
/// Dolby Vision requires an HEVC-family codec, a PQ transfer and a DOVI
/// configuration record in the side data. PQ or HLG without that record is
/// plain HDR.
pub fn classify(streams: &[MediaStreamRecord]) -> Result<VideoClassification, ClassificationError> {
    let mut videos = streams.iter().filter(|s| s.kind == StreamKind::Video);
    let video = videos.next().ok_or(ClassificationError::NoVideo)?;
    let extra = videos.count();
    if extra > 0 {
        return Err(ClassificationError::AmbiguousVideo { count: extra + 1 });
    }

    let codec = video.codec.to_lowercase();
    let transfer = video
        .color_transfer
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();

    let dv_record = video.side_data.iter().find(|sd| {
        let kind = sd.side_data_type.to_lowercase();
        DV_MARKERS.iter().any(|m| kind.contains(m))
    });

    let is_pq = transfer == PQ_TRANSFER;
    let is_dolby_vision = is_hevc(&codec) && is_pq && dv_record.is_some();
    let is_hdr = !is_dolby_vision && (is_pq || transfer == HLG_TRANSFER);

    Ok(VideoClassification {
        is_hdr,
        is_dolby_vision,
        source_stream_index: video.index,
        dv_profile: if is_dolby_vision {
            dv_record.and_then(|sd| sd.dv_profile)
        } else {
            None
        },
        width: video.width,
        codec,
    })
}
