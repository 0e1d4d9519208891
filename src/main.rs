fn main() -> anyhow::Result<()> {
    license_tui::cli::run()
}
