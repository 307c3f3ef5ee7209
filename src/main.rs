pub mod assemble;
pub mod cli;
pub mod config;
pub mod diag;
pub mod filter;
pub mod frontend;
pub mod materialize;
pub mod typedesc;
pub mod typeparse;
pub mod walker;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
