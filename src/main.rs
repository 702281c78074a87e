use anyhow::Result;

mod app;
mod logging;

fn main() -> Result<()> {
    let args = qbot::cli::parse();
    app::run(args)
}
