fn main() -> anyhow::Result<()> {
    apistub_cli::run()
}
