//! PlatformIO configuration rendering.
//!
//! A document is the template `header` (filled once) followed by one
//! `environment` block per [`RenderedEnvironment`].

mod environment;
mod template;
mod writer;

pub use environment::RenderedEnvironment;
pub use template::{
    default_template, fill_slots, load_template, parse_template, BoardSpec, BuildTemplate,
    ENVIRONMENT_SLOTS, HEADER_SLOTS,
};
pub use writer::write_atomic;

use crate::error::Result;

/// Render a complete `platformio.ini` document.
///
/// `default_envs` lists every environment identifier in order.
pub fn render_document(
    environments: &[RenderedEnvironment],
    template: &BuildTemplate,
    build_date: &str,
) -> Result<String> {
    let default_envs = environments
        .iter()
        .map(|env| env.identifier.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let header = fill_slots(
        &template.header,
        &[("default_envs", default_envs.as_str()), ("build_date", build_date)],
    )?;

    let mut document = header.trim().to_string();
    document.push('\n');
    for env in environments {
        document.push_str(&env.render(template)?);
    }
    Ok(document)
}
