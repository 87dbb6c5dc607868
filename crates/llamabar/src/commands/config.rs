use colored::Colorize;

pub fn handle(open: bool) -> anyhow::Result<()> {
    let dir = llamabar_config::manager_config_dir()?;
    println!("{}", dir.display());

    if open {
        if !dir.exists() {
            anyhow::bail!(
                "{} does not exist yet; run `llamacpp-manager init` first",
                dir.display()
            );
        }
        open::that(&dir)?;
        eprintln!("{}", "Opened in file manager".dimmed());
    }

    Ok(())
}
