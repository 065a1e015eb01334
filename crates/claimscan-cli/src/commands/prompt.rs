//! Prompt command - show what is sent to the extraction service.

use clap::Args;

/// Arguments for the prompt command.
#[derive(Args)]
pub struct PromptArgs {
    /// Print the response schema instead of the instructions
    #[arg(long)]
    schema: bool,
}

pub fn run(args: PromptArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let fields = &config.extraction.fields;

    if args.schema {
        println!("{}", serde_json::to_string_pretty(&fields.response_schema())?);
    } else {
        print!("{}", fields.instructions());
    }

    Ok(())
}
