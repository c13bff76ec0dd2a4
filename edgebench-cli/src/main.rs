fn main() -> anyhow::Result<()> {
    edgebench_cli::run()
}
