use anyhow::Result;

fn main() -> Result<()> {
    retrolog::cli::run()
}
