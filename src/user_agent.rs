//! Client identifier sent as the default `User-Agent`.

/// Product token used in the default `User-Agent`.
const PRODUCT: &str = "xcurl";

/// Default User-Agent for requests: `xcurl/<crate version>`.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version}")
}
