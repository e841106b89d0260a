//! Label segmentation: split a ZPL stream into `^XA`-delimited labels.
//!
//! The split is zero-width: every fragment boundary sits immediately before
//! a `^XA`, and the marker stays at the front of the fragment it opens.
//! Nothing is consumed, so concatenating the labels gives back the input
//! minus whitespace-only fragments.
//!
//! Text in front of the first `^XA` (a BOM-less preamble, a stray comment,
//! `~` housekeeping commands) is not a label on its own. It is carried into
//! the first label rather than dropped, so the service still sees it.

use crate::pipeline::estimate::estimate_embedded_image_bytes;
use tracing::{debug, warn};

/// Label-start directive.
pub const LABEL_START: &str = "^XA";

/// One complete `^XA…` label.
///
/// Sizes are computed once at construction: `byte_len` is the UTF-8 length,
/// which is exactly what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    text: String,
    asset_bytes: u64,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let asset_bytes = estimate_embedded_image_bytes(&text);
        Self { text, asset_bytes }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// UTF-8 byte length of the label text.
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// Estimated embedded graphic weight, see [`estimate_embedded_image_bytes`].
    pub fn asset_bytes(&self) -> u64 {
        self.asset_bytes
    }
}

/// Split `input` into labels, in source order.
///
/// Empty or all-whitespace input yields no labels. Input without any `^XA`
/// also yields no labels (with a warning): there is no label to attach the
/// text to.
pub fn split_labels(input: &str) -> Vec<Label> {
    let mut labels: Vec<String> = Vec::new();
    let mut carry = String::new();

    for fragment in fragments(input) {
        if fragment.trim().is_empty() {
            continue;
        }

        if fragment.starts_with(LABEL_START) {
            let mut text = std::mem::take(&mut carry);
            text.push_str(fragment);
            labels.push(text);
        } else if let Some(prev) = labels.last_mut() {
            prev.push_str(fragment);
        } else {
            carry.push_str(fragment);
        }
    }

    if !carry.is_empty() {
        match labels.last_mut() {
            Some(last) => last.push_str(&carry),
            None => warn!(
                "No {} found; ignoring {} bytes of non-label text",
                LABEL_START,
                carry.len()
            ),
        }
    }

    debug!("Segmented {} bytes into {} labels", input.len(), labels.len());
    labels.into_iter().map(Label::new).collect()
}

/// Cut `input` immediately before every `^XA`, keeping the marker.
fn fragments(input: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (idx, _) in input.match_indices(LABEL_START) {
        if idx > start {
            out.push(&input[start..idx]);
        }
        start = idx;
    }
    if start < input.len() {
        out.push(&input[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(labels: &[Label]) -> Vec<&str> {
        labels.iter().map(Label::text).collect()
    }

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(split_labels("").is_empty());
        assert!(split_labels("  \r\n\t ").is_empty());
    }

    #[test]
    fn splits_before_each_start_marker() {
        let input = "^XA^FO50,50^FDone^FS^XZ\n^XA^FDtwo^FS^XZ\n";
        let labels = split_labels(input);
        assert_eq!(
            texts(&labels),
            vec!["^XA^FO50,50^FDone^FS^XZ\n", "^XA^FDtwo^FS^XZ\n"]
        );
    }

    #[test]
    fn concatenation_reproduces_input() {
        let input = "^XA^FDa^FS^XZ\r\n\r\n^XA^FDb^FS^XZ^XA^XZ  \n";
        let labels = split_labels(input);
        assert_eq!(labels.len(), 3);
        let joined: String = labels.iter().map(Label::text).collect();
        assert_eq!(joined, input);
        assert!(labels.iter().all(|l| l.text().starts_with(LABEL_START)));
    }

    #[test]
    fn leading_whitespace_is_dropped() {
        let labels = split_labels("\n\n   ^XA^FDa^FS^XZ");
        assert_eq!(texts(&labels), vec!["^XA^FDa^FS^XZ"]);
    }

    #[test]
    fn leading_text_is_carried_into_first_label() {
        let labels = split_labels("~JA\n^XA^FDa^FS^XZ^XA^FDb^FS^XZ");
        assert_eq!(texts(&labels), vec!["~JA\n^XA^FDa^FS^XZ", "^XA^FDb^FS^XZ"]);
    }

    #[test]
    fn text_without_start_marker_yields_nothing() {
        assert!(split_labels("^FDno label here^FS").is_empty());
    }

    #[test]
    fn sizes_are_utf8_bytes() {
        let labels = split_labels("^XA^FDé^FS^XZ");
        assert_eq!(labels.len(), 1);
        // 'é' is two bytes in UTF-8
        assert_eq!(labels[0].byte_len(), "^XA^FD^FS^XZ".len() + 2);
        assert_eq!(labels[0].asset_bytes(), 0);
    }

    #[test]
    fn label_carries_asset_estimate() {
        let labels = split_labels("^XA^FO0,0^GFA,512,512,8,FFFF^FS^XZ");
        assert_eq!(labels[0].asset_bytes(), 512);
    }

    #[test]
    fn fragments_keep_markers() {
        assert_eq!(fragments("a^XAb^XAc"), vec!["a", "^XAb", "^XAc"]);
        assert_eq!(fragments("^XA^XA"), vec!["^XA", "^XA"]);
        assert!(fragments("").is_empty());
    }
}
