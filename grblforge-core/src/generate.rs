use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{ForgeError, Result};
use crate::flags::{merge_layers, Layer, RuleTable};
use crate::profile::MachineProfile;
use crate::render::{render_document, BuildTemplate, RenderedEnvironment};
use crate::sanitize::sanitize_identifier;

/// Every environment planned for one machine profile.
#[derive(Debug, Clone)]
pub struct MachineBuild {
    /// Machine display name.
    pub label: String,
    pub board_symbol: String,
    /// Board driver environment name, e.g. `slb_ext`.
    pub driver: String,
    pub environments: Vec<RenderedEnvironment>,
}

/// Board symbol for a machine: its own `default_board`, else the template's.
pub fn board_symbol<'a>(profile: &'a MachineProfile, template: &'a BuildTemplate) -> &'a str {
    profile
        .machine
        .default_board
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or(template.default_board.as_str())
}

/// Merge and plan every variant of one profile.
///
/// An unknown board symbol is fatal. Variants whose name sanitizes to an
/// empty identifier are skipped with a warning.
pub fn plan_machine(
    profile: &MachineProfile,
    template: &BuildTemplate,
    rules: &RuleTable,
) -> Result<MachineBuild> {
    let label = profile.display_name();
    let symbol = board_symbol(profile, template);
    let board = template
        .board(symbol)
        .ok_or_else(|| ForgeError::UnknownBoard {
            machine: label.clone(),
            board: symbol.to_string(),
        })?;

    info!(
        "Planning {} ({} variants) on {} [{}], rules v{}",
        label,
        profile.variant_count(),
        symbol,
        board.env_name,
        rules.version
    );

    let machine = &profile.machine;
    let mut environments = Vec::with_capacity(profile.variants.len());

    for variant in &profile.variants {
        let identifier = sanitize_identifier(&variant.name);
        if identifier.is_empty() {
            warn!(
                "Skipping variant {:?} of {}: name has no usable characters",
                variant.name, label
            );
            continue;
        }

        let layers = [
            Layer::new("baseline", &template.baseline),
            Layer::new("board", &board.defines),
            Layer::new("machine symbols", &machine.default_symbols),
            Layer::new("machine settings", &machine.setting_defaults),
            Layer::new("machine trinamic", &machine.setting_defaults_trinamic),
            Layer::new("variant symbols", &variant.default_symbols),
            Layer::new("variant settings", &variant.setting_defaults),
            Layer::new("variant defines", &variant.defines),
        ];
        let defines = merge_layers(&layers, rules);
        debug!("{}: {} defines", identifier, defines.len());

        environments.push(RenderedEnvironment {
            identifier,
            display_name: variant.name.clone(),
            board_symbol: symbol.to_string(),
            board: board.clone(),
            include_flags: template.include_flags.clone(),
            defines,
            lib_deps: template.lib_deps.clone(),
        });
    }

    Ok(MachineBuild {
        label,
        board_symbol: symbol.to_string(),
        driver: board.env_name.clone(),
        environments,
    })
}

/// Plan every profile, in order.
///
/// When two variants share an identifier the later one wins: the earlier entry
/// is dropped from its machine and a warning is logged. The survivor stays
/// under its own machine, at its own position.
pub fn plan_all(
    profiles: &[MachineProfile],
    template: &BuildTemplate,
    rules: &RuleTable,
) -> Result<Vec<MachineBuild>> {
    let mut builds = profiles
        .iter()
        .map(|profile| plan_machine(profile, template, rules))
        .collect::<Result<Vec<_>>>()?;

    // Last (machine, position) seen for each identifier.
    let mut winners: HashMap<String, (usize, usize)> = HashMap::new();
    for (m, build) in builds.iter().enumerate() {
        for (e, env) in build.environments.iter().enumerate() {
            if let Some((pm, pe)) = winners.insert(env.identifier.clone(), (m, e)) {
                let earlier = &builds[pm];
                warn!(
                    "Identifier {} from {:?} ({}) replaces {:?} ({})",
                    env.identifier,
                    env.display_name,
                    build.label,
                    earlier.environments[pe].display_name,
                    earlier.label
                );
            }
        }
    }

    for (m, build) in builds.iter_mut().enumerate() {
        let mut e = 0;
        build.environments.retain(|env| {
            let keep = winners.get(&env.identifier) == Some(&(m, e));
            e += 1;
            keep
        });
    }

    Ok(builds)
}

/// All planned environments in document order.
pub fn environments(builds: &[MachineBuild]) -> Vec<RenderedEnvironment> {
    builds
        .iter()
        .flat_map(|b| b.environments.iter().cloned())
        .collect()
}

/// Render the combined `platformio.ini` for every planned machine.
pub fn generate_document(
    builds: &[MachineBuild],
    template: &BuildTemplate,
    build_date: &str,
) -> Result<String> {
    let envs = environments(builds);
    info!("Rendering {} environments", envs.len());
    render_document(&envs, template, build_date)
}
