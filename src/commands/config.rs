use anyhow::Result;

use crate::Context;
use crate::cli::ConfigArgs;
use crate::config::Config;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, args: &ConfigArgs) -> Result<()> {
    let (config, loaded_from) = Config::load(args.config.as_deref())?;

    if !ctx.quiet {
        ui::header("Configuration");
        ui::kv("Config directory", &paths::config_dir()?.display().to_string());
        match &loaded_from {
            Some(path) => ui::kv("Loaded from", &path.display().to_string()),
            None => ui::kv("Loaded from", "defaults (no config file)"),
        }
        println!();
    }

    print!("{}", config.to_toml()?);
    Ok(())
}
