//! Embedded-asset estimation: how much graphic payload a label declares.
//!
//! Labelary bounds requests by decompressed graphic weight as well as by body
//! size, and a 40 KB label can declare megabytes of `^GF` raster once
//! inflated. The batch builder therefore packs against an estimate read
//! straight from the directives' declared byte counts:
//!
//! | Directive | Form | Counted parameter |
//! |-----------|------|-------------------|
//! | `~DG` / `^DG` | `~DGd:o.x,t,w,data` | `t`, total bytes (2nd) |
//! | `^GF` | `^GFa,b,c,d,data^FS` | `b`, binary byte count (2nd) |
//!
//! The scan never fails. A count that does not parse contributes zero.

/// Estimate the embedded graphic bytes declared by `text`.
///
/// ```rust
/// use zpl2pdf::pipeline::estimate::estimate_embedded_image_bytes;
///
/// assert_eq!(estimate_embedded_image_bytes("~DG:X.GRF,1234,10,:data:"), 1234);
/// assert_eq!(estimate_embedded_image_bytes("^XA^FDhello^FS^XZ"), 0);
/// ```
pub fn estimate_embedded_image_bytes(text: &str) -> u64 {
    let mut total: u64 = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let (count, consumed) = if rest.starts_with("~DG") || rest.starts_with("^DG") {
            download_graphic(&rest[3..])
        } else if rest.starts_with("^GF") {
            graphic_field(&rest[3..])
        } else {
            // Markers are ASCII; stepping to the next char keeps `pos` on a
            // char boundary.
            let step = rest.chars().next().map_or(1, char::len_utf8);
            pos += step;
            continue;
        };
        total = total.saturating_add(count);
        pos += 3 + consumed;
    }

    total
}

/// `~DG` parameters run until the next command prefix.
///
/// Returns the declared count and the number of bytes consumed.
fn download_graphic(params: &str) -> (u64, usize) {
    let end = params.find(['^', '~']).unwrap_or(params.len());
    let count = second_param(&params[..end])
        .and_then(|p| p.trim().parse::<u64>().ok())
        .unwrap_or(0);
    (count, end)
}

/// `^GF` runs until the closing `^FS`, or end of text when unterminated.
///
/// The byte count is read leniently: non-digits are stripped first, so
/// `12 34` or `1234x` still count.
fn graphic_field(params: &str) -> (u64, usize) {
    let end = params.find("^FS").unwrap_or(params.len());
    let count = second_param(&params[..end])
        .map(|p| p.chars().filter(char::is_ascii_digit).collect::<String>())
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse::<u64>().ok())
        .unwrap_or(0);
    (count, end)
}

fn second_param(span: &str) -> Option<&str> {
    span.split(',').nth(1)
}
