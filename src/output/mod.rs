//! Response delivery.
//!
//! - [`filename`]: where the body goes
//! - [`pipeline`]: counting, optional text decoding and writing
//! - [`echo`]: header echo for `--verbose` and `--include`

pub mod echo;
pub mod filename;
pub mod pipeline;

pub use echo::{format_request_echo, format_response_echo};
pub use filename::resolve_output_file_name;
pub use pipeline::{CountingStream, Destination, TransferOutcome, Utf8Decoder, stream_body};
