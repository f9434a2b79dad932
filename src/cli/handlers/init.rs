use std::fs;
use std::path::PathBuf;

use crate::cli::commands::InitArgs;
use crate::io::config_io::{self, STORE_DIR};
use crate::ops::filter::BaseFilter;

const CONFIG_TEMPLATE: &str = r##"# slate configuration

[list]
# View used by `slate list` and `slate stats` without a flag:
# "all", "active", or "completed"
default_filter = "{default_filter}"
# Prefix each listed todo with its short id
show_ids = true
# Truncate listed lines to this many terminal cells (0 = no limit)
max_width = 0

[store]
# How long a write waits for another slate process, in milliseconds
lock_timeout_ms = 5000
"##;

fn render_config(default_filter: BaseFilter) -> String {
    CONFIG_TEMPLATE.replace("{default_filter}", default_filter.as_str())
}

pub fn cmd_init(args: InitArgs, project_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let base = match project_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let store_dir = base.join(STORE_DIR);

    if store_dir.is_dir() && !args.force {
        return Err(format!("slate store already exists in {}", store_dir.display()).into());
    }

    let default_filter = match args.default_filter.as_deref() {
        Some(name) => name.parse::<BaseFilter>()?,
        None => BaseFilter::default(),
    };

    // Check for an enclosing store and warn
    if let Some(parent) = base.parent()
        && let Ok(outer) = config_io::discover_store_dir(parent)
    {
        eprintln!("Note: enclosing store found at {}/", outer.display());
        eprintln!("Creating new store in {}/", store_dir.display());
    }

    fs::create_dir_all(&store_dir)?;
    fs::write(config_io::config_path(&store_dir), render_config(default_filter))?;
    tracing::debug!(dir = %store_dir.display(), "initialized store");

    println!("Initialized slate store in {}/", store_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::Config;

    #[test]
    fn test_rendered_config_parses() {
        let config: Config = toml::from_str(&render_config(BaseFilter::Active)).unwrap();
        assert_eq!(config.list.default_filter, BaseFilter::Active);
        assert!(config.list.show_ids);
        assert_eq!(config.list.max_width, 0);
        assert_eq!(config.store.lock_timeout_ms, 5000);
    }

    #[test]
    fn test_rendered_config_default_filter() {
        let text = render_config(BaseFilter::default());
        assert!(text.contains("default_filter = \"all\""));
    }
}
