//! Pipeline stages for ZPL-to-PDF rendering.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the transport can be swapped without touching the packing logic.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ segment ──▶ batch ──▶ submit ──▶ persist
//! (.txt)    (^XA split)  (pack)    (paced POST) (.pdf)
//!                 ▲
//!              estimate
//! ```
//!
//! 1. [`input`]    — expand paths into `.txt` files and read them as UTF-8
//! 2. [`segment`]  — split the text into labels before every `^XA`
//! 3. [`estimate`] — weigh each label's declared `~DG` / `^GF` graphics
//! 4. [`batch`]    — pack consecutive labels under count, byte and graphic
//!    bounds
//! 5. [`submit`]   — wait on the rate gate, then POST the batch; the only
//!    stage with network I/O
//! 6. [`persist`]  — write each PDF as `<DD-MM-YYYY>-label-<NNN>.pdf`

pub mod batch;
pub mod estimate;
pub mod input;
pub mod persist;
pub mod segment;
pub mod submit;
