use audcgt::cmd::{
    lots::LotsCommand, realizations::RealizationsCommand, schema::SchemaCommand,
    summary::SummaryCommand, validate::ValidateCommand,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "audcgt", version, about = "Calculate Australian Capital Gains Tax on share trades")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Net capital gain and carried loss per financial year
    Summary(SummaryCommand),
    /// Every matched parcel with its cost base, proceeds and holding period
    Realizations(RealizationsCommand),
    /// Lots still held after all sales
    Lots(LotsCommand),
    /// Check input files and matching without generating reports
    Validate(ValidateCommand),
    /// Print the expected input formats
    Schema(SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Summary(cmd) => cmd.exec(),
        Command::Realizations(cmd) => cmd.exec(),
        Command::Lots(cmd) => cmd.exec(),
        Command::Validate(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
    }
}
