use crate::error::Result;
use crate::flags::DefineSet;

use super::template::{fill_slots, BoardSpec, BuildTemplate};

/// One `[env:...]` build target, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEnvironment {
    /// Sanitized identifier; the section name and the `pio run -e` argument.
    pub identifier: String,
    /// Variant display name as written in the profile.
    pub display_name: String,
    /// Board symbol that selected `board`.
    pub board_symbol: String,
    pub board: BoardSpec,
    pub include_flags: Vec<String>,
    pub defines: DefineSet,
    pub lib_deps: Vec<String>,
}

impl RenderedEnvironment {
    /// Fill the template's `environment` text for this target.
    pub fn render(&self, template: &BuildTemplate) -> Result<String> {
        let include_flags = indent_lines(self.include_flags.iter().map(String::as_str));
        let define_flags = indent_lines(self.defines.to_flags().iter().map(String::as_str));
        let lib_deps = indent_lines(self.lib_deps.iter().map(String::as_str));
        let prog_version = self.board.env_name.to_uppercase();

        fill_slots(
            &template.environment,
            &[
                ("display_name", self.display_name.as_str()),
                ("env_name", self.identifier.as_str()),
                ("board", self.board.board.as_str()),
                ("upload_protocol", self.board.upload_protocol.as_str()),
                ("ldscript", self.board.ldscript.as_str()),
                ("prog_version", prog_version.as_str()),
                ("include_flags", include_flags.as_str()),
                ("define_flags", define_flags.as_str()),
                ("lib_deps", lib_deps.as_str()),
            ],
        )
    }
}

/// INI continuation lines: two-space indent, one entry per line.
fn indent_lines<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items
        .map(|item| format!("  {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{merge_layers, Layer, RuleTable};
    use crate::render::template::default_template;
    use serde_json::json;

    fn environment() -> RenderedEnvironment {
        let template = default_template();
        let symbols = match json!({"N_AXIS": 4, "WEB_BUILD": true, "SAFETY_DOOR": false}) {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        };
        RenderedEnvironment {
            identifier: "test_a".into(),
            display_name: "Test (A)".into(),
            board_symbol: "BOARD_LONGBOARD32_EXT".into(),
            board: template.board("BOARD_LONGBOARD32_EXT").unwrap().clone(),
            include_flags: template.include_flags.clone(),
            defines: merge_layers(&[Layer::new("variant", &symbols)], &RuleTable::passthrough()),
            lib_deps: template.lib_deps.clone(),
        }
    }

    #[test]
    fn test_render_environment_section() {
        let text = environment().render(&default_template()).unwrap();
        assert!(text.contains("; Test (A)\n[env:test_a]\n"));
        assert!(text.contains("board = genericSTM32F412VG\n"));
        assert!(text.contains("board_build.ldscript = STM32F412VGTX_FLASH.ld\n"));
        assert!(text.contains("custom_prog_version = SLB_EXT\n"));
        assert!(text.contains("  -D N_AXIS=4\n  -D WEB_BUILD\n"));
        assert!(!text.contains("SAFETY_DOOR"));
    }

    #[test]
    fn test_render_keeps_platformio_markers() {
        let text = environment().render(&default_template()).unwrap();
        assert!(text.contains("  ${common.build_flags}\n"));
        assert!(text.contains("lib_extra_dirs = ${common.lib_extra_dirs}"));
    }

    #[test]
    fn test_include_flags_precede_defines() {
        let text = environment().render(&default_template()).unwrap();
        let include = text.find("-I ./3rdparty/grblhal-rgb-plugin").unwrap();
        let define = text.find("-D N_AXIS=4").unwrap();
        assert!(include < define);
    }
}
