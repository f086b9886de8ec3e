fn main() -> anyhow::Result<()> {
    gutensuggest::cli::run()
}
