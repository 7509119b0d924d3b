use anyhow::Result;
use klipper_config_editor::cli::run;

fn main() -> Result<()> {
    run()
}
