use clap::Subcommand;
use etude_core::storage::LinkList;

use super::{open_store, print_json, CliResult};

#[derive(Subcommand)]
pub enum LinkAction {
    /// List saved links
    List {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a link
    Add { name: String, url: String },
    /// Delete a link
    Delete { id: String },
}

pub fn run(action: LinkAction) -> CliResult {
    let links = LinkList::new(open_store()?);

    match action {
        LinkAction::List { json } => {
            let all = links.links();
            if json {
                return print_json(&all);
            }
            for link in &all {
                println!("{}  {}  {}", link.id, link.name, link.url);
            }
        }
        LinkAction::Add { name, url } => {
            let link = links.add(&name, &url)?;
            print_json(&link)?;
        }
        LinkAction::Delete { id } => {
            if !links.delete(&id)? {
                return Err(format!("no link with id '{id}'").into());
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}
