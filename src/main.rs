fn main() -> anyhow::Result<()> {
    glassnotes::cli::run()
}
