use anyhow::Result;
use clap::Args;
use colored::Colorize;
use trello_connector::connector::resource_types;

use crate::output;

#[derive(Args)]
pub struct ResourceTypesArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool
}

pub fn run(args: &ResourceTypesArgs) -> Result<()> {
    let resource_types = resource_types::all();

    if args.json {
        return output::json(&resource_types);
    }

    output::header("Resource Types");
    println!();
    for resource_type in &resource_types {
        let traits: Vec<String> = resource_type.traits.iter().map(ToString::to_string).collect();
        println!(
            "  {:<14} {:<14} {}",
            resource_type.id.cyan(),
            resource_type.display_name,
            traits.join(", ").dimmed()
        );
    }
    Ok(())
}
