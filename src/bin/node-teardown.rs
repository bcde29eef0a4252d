use anyhow::Result;

fn main() -> Result<()> {
    node_teardown::cli::run()
}
