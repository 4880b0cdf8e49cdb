fn main() -> anyhow::Result<()> {
    rafiq_dashboard::cli::run()
}
