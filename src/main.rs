use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    cilscope::cli::run()
}
