use miette::Result;
use orgshift_core::OrgshiftConfig;
use orgshift_core::config;

use crate::output::Output;

/// Show the effective configuration
pub async fn show(config: &OrgshiftConfig, output: &Output) -> Result<()> {
    if output.is_json() {
        return output.report(config);
    }

    output.section("Current Configuration");
    output.info("Store:", &config.store.path.display().to_string());
    output.print("");

    // Already formatted TOML, printed as is.
    let toml_str = config::to_toml(config)?;
    for line in toml_str.lines() {
        output.print(line);
    }

    Ok(())
}
